use tracing::Level;
use warden_core::LogLevel;

use super::{Violation, ViolationSink};
use crate::error::SinkError;
use crate::ACCESS_TARGET;

// `tracing` needs the level as a constant, hence one expansion per level.
macro_rules! access_event {
    ($level:expr, $violation:expr) => {{
        let violation = $violation;
        let principals = violation.principals_display();
        tracing::event!(
            target: ACCESS_TARGET,
            $level,
            permission = %violation.permission(),
            domain = %violation.domain().id(),
            code_source = %violation.code_source(),
            loader = violation.loader().unwrap_or("<none>"),
            principals = principals.as_deref(),
            "Permission check failed"
        );
    }};
}

/// Emits each violation as a structured `tracing` event on `warden::access`
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: LogLevel,
}

impl TracingSink {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl ViolationSink for TracingSink {
    fn record(&self, violation: &Violation<'_>) -> Result<(), SinkError> {
        match self.level {
            LogLevel::Trace => access_event!(Level::TRACE, violation),
            LogLevel::Debug => access_event!(Level::DEBUG, violation),
            LogLevel::Info => access_event!(Level::INFO, violation),
            LogLevel::Warn => access_event!(Level::WARN, violation),
            LogLevel::Error => access_event!(Level::ERROR, violation),
        }
        Ok(())
    }
}
