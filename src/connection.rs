//! Single-attempt connect: sign the handshake, open the socket, and
//! translate handshake HTTP failures into [`Error`] kinds (spec §4.5).

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::signer::sign_handshake;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
pub(crate) type WsWrite = SplitSink<WsStream, Message>;
pub(crate) type WsRead = SplitStream<WsStream>;

/// Translate a handshake HTTP status code into the error kind spec §4.5
/// names, with its retryability.
pub(crate) fn classify_status(status: StatusCode) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::ClientError {
            status_code: 401,
            message: "Authentication failed".to_string(),
        },
        StatusCode::FORBIDDEN => Error::ClientError {
            status_code: 403,
            message: "Forbidden".to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => Error::ServerError {
            status_code: 429,
            message: "Too many connections".to_string(),
        },
        other => Error::ServerError {
            status_code: other.as_u16(),
            message: format!("Unexpected status code: {}", other.as_u16()),
        },
    }
}

fn build_request(cfg: &ClientConfig, uri: &str) -> Result<Request> {
    let mut request = cfg.endpoint.as_str().into_client_request()?;
    let headers = sign_handshake(&cfg.app_id, &cfg.app_secret, uri, std::time::SystemTime::now());

    let header_map = request.headers_mut();
    header_map.insert(
        HeaderName::from_static("x-kso-date"),
        HeaderValue::from_str(&headers.date).map_err(|e| Error::ConnectionError(e.to_string()))?,
    );
    header_map.insert(
        HeaderName::from_static("x-kso-authorization"),
        HeaderValue::from_str(&headers.authorization)
            .map_err(|e| Error::ConnectionError(e.to_string()))?,
    );
    if cfg.ack_mode {
        header_map.insert(
            HeaderName::from_static("x-ack-mode"),
            HeaderValue::from_static("required"),
        );
    }
    Ok(request)
}

/// Path + query of `cfg.endpoint`, as fed into the handshake signature.
fn request_uri(cfg: &ClientConfig) -> Result<String> {
    let url = url::Url::parse(&cfg.endpoint)?;
    let mut uri = url.path().to_string();
    if let Some(query) = url.query() {
        uri.push('?');
        uri.push_str(query);
    }
    Ok(uri)
}

/// Attempt one connection. On success returns the split socket halves
/// already transitioned past the HTTP upgrade; the caller owns arming the
/// pong-deadline timer and resetting `receivedGoAway`/`retryCount`
/// (spec §4.5's final paragraph).
pub(crate) async fn connect_once(cfg: &ClientConfig) -> Result<(WsWrite, WsRead)> {
    let uri = request_uri(cfg)?;
    let request = build_request(cfg, &uri)?;

    let connect = tokio_tungstenite::connect_async(request);
    let outcome = tokio::time::timeout(cfg.timing.write_timeout, connect).await;

    let (ws, _response) = match outcome {
        Ok(Ok(pair)) => pair,
        Ok(Err(tokio_tungstenite::tungstenite::Error::Http(response))) => {
            return Err(classify_status(response.status()));
        }
        Ok(Err(other)) => return Err(Error::WebSocket(Box::new(other))),
        Err(_elapsed) => {
            return Err(Error::ServerError {
                status_code: 0,
                message: "Connection timeout".to_string(),
            })
        }
    };

    Ok(ws.split())
}
