//! Client configuration surface (spec §6), mirroring the shape of the
//! teacher's `SubscribeConfig`.

use std::sync::Arc;
use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::logger::{LogLevel, Logger, TracingLogger};

pub(crate) const DEFAULT_ENDPOINT: &str = "wss://openapi.wps.cn/v7/event/ws";

/// Exponential backoff policy between reconnect attempts (spec §3).
#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    pub auto_reconnect: bool,
    pub base_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    /// `-1` means unlimited.
    pub max_retry: i64,
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            base_interval_ms: 1000,
            max_interval_ms: 60_000,
            multiplier: 2.0,
            max_retry: -1,
            jitter: 0.2,
        }
    }
}

/// Grouping of the handshake/liveness duration knobs, analogous to the
/// teacher's `TimingConfig`.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    pub write_timeout: Duration,
    pub pong_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_millis(10_000),
            pong_timeout: Duration::from_millis(90_000),
        }
    }
}

/// Top-level configuration for the client (spec §6).
///
/// `dispatcher` is the sole event sink. A "bare handler" (spec §6's
/// `handler` option) is just a [`Dispatcher`] with only a fallback
/// registered — see [`Dispatcher::with_fallback`].
pub struct ClientConfig {
    pub app_id: String,
    pub app_secret: String,
    pub endpoint: String,
    pub logger: Arc<dyn Logger>,
    pub log_level: LogLevel,
    pub reconnect: ReconnectConfig,
    pub timing: TimingConfig,
    pub ack_mode: bool,
    pub dispatcher: Option<Dispatcher>,
}

impl ClientConfig {
    /// A config with the vendor defaults from spec §6, given only
    /// credentials. Callers set `dispatcher` before `start()`.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            logger: Arc::new(TracingLogger),
            log_level: LogLevel::Info,
            reconnect: ReconnectConfig::default(),
            timing: TimingConfig::default(),
            ack_mode: true,
            dispatcher: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>, level: LogLevel) -> Self {
        self.logger = logger;
        self.log_level = level;
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_ack_mode(mut self, ack_mode: bool) -> Self {
        self.ack_mode = ack_mode;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = ClientConfig::new("id", "secret");
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
        assert!(cfg.ack_mode);
        assert_eq!(cfg.reconnect.base_interval_ms, 1000);
        assert_eq!(cfg.reconnect.max_interval_ms, 60_000);
        assert_eq!(cfg.reconnect.max_retry, -1);
        assert_eq!(cfg.timing.pong_timeout, Duration::from_millis(90_000));
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = ClientConfig::new("id", "secret")
            .with_endpoint("wss://example.test/ws")
            .with_ack_mode(false);
        assert_eq!(cfg.endpoint, "wss://example.test/ws");
        assert!(!cfg.ack_mode);
    }
}
