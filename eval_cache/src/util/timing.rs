use std::borrow::Cow;
use std::time::{Duration, Instant};

use log::{self, Level};

/// Measures a scope. The elapsed time is always available for metrics; the
/// log line on drop is only produced when the label was built.
pub struct ScopedTimer {
    label: Option<Cow<'static, str>>,
    level: Level,
    start: Instant,
}

impl ScopedTimer {
    pub fn with_level(label: impl Into<Cow<'static, str>>, level: Level) -> Self {
        Self {
            label: Some(label.into()),
            level,
            start: Instant::now(),
        }
    }

    pub fn debug(label: impl Into<Cow<'static, str>>) -> Self {
        Self::with_level(label, Level::Debug)
    }

    /// Build the label only if `level` is enabled, so hot paths pay nothing
    /// for formatting when logging is off.
    pub fn lazy<F>(level: Level, label_gen: F) -> Self
    where
        F: FnOnce() -> String,
    {
        let label = if log::log_enabled!(level) {
            Some(Cow::Owned(label_gen()))
        } else {
            None
        };
        Self {
            label,
            level,
            start: Instant::now(),
        }
    }

    pub fn trace_lazy<F>(label_gen: F) -> Self
    where
        F: FnOnce() -> String,
    {
        Self::lazy(Level::Trace, label_gen)
    }

    pub fn debug_lazy<F>(label_gen: F) -> Self
    where
        F: FnOnce() -> String,
    {
        Self::lazy(Level::Debug, label_gen)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if let Some(label) = &self.label {
            let micros = self.start.elapsed().as_micros();
            log::log!(self.level, "{} took {} µs", label, micros);
        }
    }
}
