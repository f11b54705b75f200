//! Lifecycle controller: connect, reconnect loop, pong liveness, goaway
//! handling (spec §4.7).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::backoff::{calculate_backoff, should_reconnect};
use crate::config::ClientConfig;
use crate::connection::connect_once;
use crate::dispatcher::require_configured;
use crate::error::{Error, Result};
use crate::logger::LogSink;
use crate::pipeline::{disables_reconnect, handle_frame, FrameOutcome};

/// Lifecycle state (spec §3/§4.7). `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

/// Outcome of one fully-connected session, used to decide the next
/// lifecycle transition.
enum SessionEnd {
    /// Socket closed or errored; attempt reconnect if policy allows.
    Retry,
    /// A GoAway with `connection_replaced` was observed.
    Replaced,
    /// `stop()` was called.
    Stopped,
}

/// A running (or not-yet-started) client instance. Only one WebSocket may
/// exist at a time; `start()` after a prior `start()` is a programmer error
/// (spec §3's single-socket invariant), surfaced as `AlreadyConnectedError`.
pub struct Client {
    cfg: ClientConfig,
    log: LogSink,
    state: Arc<Mutex<ConnectionState>>,
    started: AtomicBool,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl Client {
    pub fn new(cfg: ClientConfig) -> Self {
        let log = LogSink::new(cfg.logger.clone(), cfg.log_level);
        Self {
            cfg,
            log,
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            started: AtomicBool::new(false),
            close_tx: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    /// Run the client's lifecycle until `stop()` is called, the server
    /// permanently disables reconnect, retries are exhausted, or a
    /// non-retryable `ClientError` surfaces from the handshake.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if *state == ConnectionState::Closed {
                return Err(Error::ClientClosedError);
            }
            *state = ConnectionState::Connecting;
        }

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyConnectedError);
        }

        let dispatcher = self
            .cfg
            .dispatcher
            .clone()
            .ok_or(Error::HandlerNotSetError)?;
        require_configured(&dispatcher)?;

        let (close_tx, mut close_rx) = oneshot::channel();
        *self.close_tx.lock().await = Some(close_tx);

        let mut reconnect_cfg = self.cfg.reconnect;
        let mut retry_count: u32 = 0;

        loop {
            *self.state.lock().await = ConnectionState::Connecting;
            let attempt = tokio::select! {
                attempt = connect_once(&self.cfg) => attempt,
                _ = &mut close_rx => {
                    *self.state.lock().await = ConnectionState::Closed;
                    return Ok(());
                }
            };

            let (ws_write, ws_read) = match attempt {
                Ok(pair) => pair,
                Err(e) if !e.is_retryable() => {
                    *self.state.lock().await = ConnectionState::Closed;
                    return Err(e);
                }
                Err(e) => {
                    self.log.warn(format!("connect failed: {e}"));
                    *self.state.lock().await = ConnectionState::Reconnecting;
                    match self
                        .wait_for_backoff(&reconnect_cfg, &mut retry_count, &mut close_rx)
                        .await?
                    {
                        Some(()) => continue,
                        None => return Ok(()),
                    }
                }
            };

            retry_count = 0;
            *self.state.lock().await = ConnectionState::Connected;
            self.log.info("connected");

            let end = self
                .run_session(ws_write, ws_read, &dispatcher, &mut reconnect_cfg, &mut close_rx)
                .await;

            match end {
                SessionEnd::Stopped => {
                    *self.state.lock().await = ConnectionState::Closed;
                    return Ok(());
                }
                SessionEnd::Replaced => {
                    reconnect_cfg.auto_reconnect = false;
                    *self.state.lock().await = ConnectionState::Closed;
                    return Ok(());
                }
                SessionEnd::Retry => {
                    *self.state.lock().await = ConnectionState::Reconnecting;
                    match self
                        .wait_for_backoff(&reconnect_cfg, &mut retry_count, &mut close_rx)
                        .await?
                    {
                        Some(()) => continue,
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    /// Wait out one backoff interval, honoring `maxRetry` and cancellation.
    /// `Ok(Some(()))` means "try again"; `Ok(None)` means `stop()` fired.
    async fn wait_for_backoff(
        &self,
        cfg: &crate::config::ReconnectConfig,
        retry_count: &mut u32,
        close_rx: &mut oneshot::Receiver<()>,
    ) -> Result<Option<()>> {
        *retry_count += 1;
        if !should_reconnect(cfg, *retry_count - 1) {
            *self.state.lock().await = ConnectionState::Closed;
            return Err(Error::ReconnectExceededError {
                retry_count: *retry_count,
            });
        }

        let delay = calculate_backoff(cfg, *retry_count);
        self.log
            .debug(format!("reconnecting in {delay}ms (attempt {retry_count})"));

        tokio::select! {
            _ = tokio::time::sleep(std::time::Duration::from_millis(delay)) => Ok(Some(())),
            _ = close_rx => {
                *self.state.lock().await = ConnectionState::Closed;
                Ok(None)
            }
        }
    }

    /// Drive one connected session until it ends (socket close, goaway,
    /// pong timeout, or `stop()`).
    async fn run_session(
        &self,
        mut ws_write: crate::connection::WsWrite,
        mut ws_read: crate::connection::WsRead,
        dispatcher: &crate::dispatcher::Dispatcher,
        reconnect_cfg: &mut crate::config::ReconnectConfig,
        close_rx: &mut oneshot::Receiver<()>,
    ) -> SessionEnd {
        let mut received_goaway = false;
        let mut pong_deadline = Instant::now() + self.cfg.timing.pong_timeout;
        let write_timeout = self.cfg.timing.write_timeout;

        loop {
            tokio::select! {
                frame = ws_read.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            match handle_frame(&self.cfg, dispatcher, &self.log, received_goaway, &text).await {
                                FrameOutcome::Handled => {}
                                FrameOutcome::Ack(ack) => {
                                    if let Ok(json) = serde_json::to_string(&ack) {
                                        match tokio::time::timeout(write_timeout, ws_write.send(WsMessage::Text(json.into()))).await {
                                            Ok(Err(e)) => self.log.warn(format!("ack send failed: {e}")),
                                            Err(_) => self.log.warn("ack send timed out"),
                                            Ok(Ok(())) => {}
                                        }
                                    }
                                }
                                FrameOutcome::GoAway(goaway) => {
                                    received_goaway = true;
                                    if disables_reconnect(&goaway) {
                                        self.log.warn("connection replaced; disabling auto-reconnect");
                                        return SessionEnd::Replaced;
                                    }
                                    if let Some(ms) = goaway.reconnect_ms {
                                        if ms > 0 {
                                            reconnect_cfg.base_interval_ms = ms;
                                        }
                                    }
                                }
                            }
                        }
                        Some(Ok(WsMessage::Ping(payload))) => {
                            pong_deadline = Instant::now() + self.cfg.timing.pong_timeout;
                            match tokio::time::timeout(write_timeout, ws_write.send(WsMessage::Pong(payload))).await {
                                Ok(Err(e)) => self.log.warn(format!("pong send failed: {e}")),
                                Err(_) => self.log.warn("pong send timed out"),
                                Ok(Ok(())) => {}
                            }
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            self.log.info("socket closed");
                            return SessionEnd::Retry;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            self.log.warn(format!("websocket error: {e}"));
                            return SessionEnd::Retry;
                        }
                    }
                }
                () = tokio::time::sleep_until(pong_deadline) => {
                    self.log.warn("pong liveness timeout; forcing reconnect");
                    let _ = ws_write.close().await;
                    return SessionEnd::Retry;
                }
                _ = &mut *close_rx => {
                    let _ = ws_write.close().await;
                    return SessionEnd::Stopped;
                }
            }
        }
    }

    /// Idempotent: transitions to `Closed`, cancels any pending backoff
    /// waiter, and force-closes the socket (spec §4.7's stop semantics).
    pub async fn stop(&self) {
        if let Some(close_tx) = self.close_tx.lock().await.take() {
            let _ = close_tx.send(());
        }
        *self.state.lock().await = ConnectionState::Closed;
    }
}
