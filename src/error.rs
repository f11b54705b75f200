//! Error taxonomy (spec §7).

/// Errors returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-retryable handshake/session failure (e.g. 401/403). Surfaces from
    /// `start()` and stops the lifecycle.
    #[error("client error ({status_code}): {message}")]
    ClientError { status_code: u16, message: String },

    /// Retryable handshake/session failure (e.g. 429, 5xx, timeout). Triggers
    /// backoff + reconnect if policy allows, else surfaces.
    #[error("server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    /// Per-event signature mismatch. The event is dropped, no ACK is sent.
    #[error("signature verification failed")]
    SignatureError,

    /// Per-event decryption failure. The event is dropped, no ACK is sent.
    #[error("decrypt failed: {0}")]
    DecryptError(String),

    /// Generic transport failure while `Connected`. Drives reconnect.
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Neither a handler nor a dispatcher was configured before `start()`.
    #[error("no handler or dispatcher configured")]
    HandlerNotSetError,

    /// Backoff gave up per `ReconnectConfig::max_retry`.
    #[error("reconnect attempts exhausted after {retry_count} tries")]
    ReconnectExceededError { retry_count: u32 },

    /// Any operation attempted after `stop()`, or during a cancelled backoff.
    #[error("client is closed")]
    ClientClosedError,

    /// Reserved for re-entry guards: connecting while a socket already exists.
    #[error("client is already connected")]
    AlreadyConnectedError,

    /// Boxed because `tungstenite::Error`'s `Http` variant carries a full
    /// `http::Response`, which otherwise balloons every `Result<_, Error>`.
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(Box::new(err))
    }
}

impl Error {
    /// Whether this error kind should trigger a reconnect attempt rather
    /// than surfacing immediately (spec §7 propagation policy).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ServerError { .. } | Error::ConnectionError(_) | Error::WebSocket(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
