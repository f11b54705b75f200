//! Leveled log sink consumed by the client.
//!
//! The core never reaches for a logging crate directly to report domain
//! events (goaway received, backoff scheduled, signature mismatch, ...) —
//! instead it calls through this trait, so a host application can route
//! those lines anywhere it likes. [`TracingLogger`] is the default sink and
//! simply forwards to the `tracing` crate.

use std::sync::Arc;

/// Severity of a single log line emitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Threshold value only: nothing is ever logged at this level.
    Silent,
}

/// A sink for client log lines.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Default [`Logger`] that forwards to the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::Silent => {}
        }
    }
}

/// Threshold + sink pair, held by the client and consulted before every log call.
#[derive(Clone)]
pub(crate) struct LogSink {
    pub(crate) logger: Arc<dyn Logger>,
    pub(crate) level: LogLevel,
}

impl LogSink {
    pub(crate) fn new(logger: Arc<dyn Logger>, level: LogLevel) -> Self {
        Self { logger, level }
    }

    pub(crate) fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if level >= self.level && self.level != LogLevel::Silent {
            self.logger.log(level, message.as_ref());
        }
    }

    pub(crate) fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub(crate) fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub(crate) fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub(crate) fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger), LogLevel::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Captured(Mutex<Vec<(LogLevel, String)>>);

    impl Logger for Captured {
        fn log(&self, level: LogLevel, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    #[test]
    fn silent_threshold_suppresses_everything() {
        let captured = Arc::new(Captured::default());
        let sink = LogSink::new(captured.clone(), LogLevel::Silent);
        sink.error("should not appear");
        assert!(captured.0.lock().unwrap().is_empty());
    }

    #[test]
    fn threshold_filters_below_level() {
        let captured = Arc::new(Captured::default());
        let sink = LogSink::new(captured.clone(), LogLevel::Warn);
        sink.info("filtered out");
        sink.warn("kept");
        sink.error("kept too");
        let lines = captured.0.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].1, "kept");
        assert_eq!(lines[1].1, "kept too");
    }
}
