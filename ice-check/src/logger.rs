//! Logging handle injected into every checklist entry.
//!
//! Every record is emitted as a `tracing` event. A handle built with
//! [`Logger::channel`] additionally forwards records to a receiver, which is
//! how callers (and tests) observe the diagnostics of a single entry.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub context: String,
    pub message: String,
}

#[derive(Clone)]
pub struct Logger {
    tx: Option<Sender<LogRecord>>,
    context: Arc<str>,
}

impl Logger {
    /// Logger that only emits `tracing` events.
    pub fn noop() -> Self {
        Logger {
            tx: None,
            context: Arc::from(""),
        }
    }

    /// Logger forwarding a copy of every record to the returned receiver.
    pub fn channel() -> (Self, Receiver<LogRecord>) {
        let (tx, rx) = mpsc::channel();
        (
            Logger {
                tx: Some(tx),
                context: Arc::from(""),
            },
            rx,
        )
    }

    /// Same sink, tagged with the given context (usually a pair description).
    pub fn with_context(&self, context: impl Into<String>) -> Self {
        Logger {
            tx: self.tx.clone(),
            context: Arc::from(context.into()),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn debug(&self, msg: &str) {
        tracing::debug!(target: "ice_check", pair = %self.context, "{}", msg);
        self.forward(LogLevel::Debug, msg);
    }

    pub fn info(&self, msg: &str) {
        tracing::info!(target: "ice_check", pair = %self.context, "{}", msg);
        self.forward(LogLevel::Info, msg);
    }

    pub fn warn(&self, msg: &str) {
        tracing::warn!(target: "ice_check", pair = %self.context, "{}", msg);
        self.forward(LogLevel::Warn, msg);
    }

    pub fn error(&self, msg: &str) {
        tracing::error!(target: "ice_check", pair = %self.context, "{}", msg);
        self.forward(LogLevel::Error, msg);
    }

    fn forward(&self, level: LogLevel, msg: &str) {
        if let Some(tx) = &self.tx {
            // receiver gone means nobody is listening anymore
            let _ = tx.send(LogRecord {
                level,
                context: self.context.to_string(),
                message: msg.to_string(),
            });
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("context", &self.context)
            .field("forwarding", &self.tx.is_some())
            .finish()
    }
}
