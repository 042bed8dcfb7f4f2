use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONTEXT_WINDOW, DEFAULT_GPU_LAYERS, DEFAULT_RELEASE_TIMEOUT_MS, DEFAULT_WATCHDOG_MS,
    PROJECTOR_EXTENSION,
};

/// Whether accelerated inference paths exist where the session runs.
///
/// Supplied by the caller or the environment. An unavailable hint does not
/// fail the session, it only adds an informational note on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccelerationHint {
    #[default]
    Available,
    Unavailable { reason: String },
}

impl AccelerationHint {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        AccelerationHint::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AccelerationHint::Available)
    }
}

/// Options for one vision session initialization.
///
/// Automatic context shifting has no switch here: it is always off while a
/// projector is attached. See [`SessionOptions::context_shift`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub context_window: u32,
    pub watchdog: Duration,
    pub release_timeout: Duration,
    /// Forwarded to the engine's attach call.
    pub use_acceleration: bool,
    /// Forwarded to the factory when the base context is opened.
    pub gpu_layers: u32,
    pub projector_extension: String,
    pub acceleration: AccelerationHint,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            watchdog: Duration::from_millis(DEFAULT_WATCHDOG_MS),
            release_timeout: Duration::from_millis(DEFAULT_RELEASE_TIMEOUT_MS),
            use_acceleration: true,
            gpu_layers: DEFAULT_GPU_LAYERS,
            projector_extension: PROJECTOR_EXTENSION.to_string(),
            acceleration: AccelerationHint::Available,
        }
    }
}

impl SessionOptions {
    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = tokens;
        self
    }

    pub fn with_watchdog(mut self, deadline: Duration) -> Self {
        self.watchdog = deadline;
        self
    }

    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        self.release_timeout = timeout;
        self
    }

    pub fn with_acceleration(mut self, hint: AccelerationHint) -> Self {
        self.acceleration = hint;
        self
    }

    /// Silent context truncation with an attached projector is unsafe.
    pub fn context_shift(&self) -> bool {
        false
    }

    pub fn context_params(&self) -> ContextParams {
        ContextParams::from(self)
    }
}

/// Numeric options handed to the engine factory when opening a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextParams {
    pub context_window: u32,
    pub context_shift: bool,
    pub gpu_layers: u32,
}

impl From<&SessionOptions> for ContextParams {
    fn from(opts: &SessionOptions) -> Self {
        Self {
            context_window: opts.context_window,
            context_shift: opts.context_shift(),
            gpu_layers: opts.gpu_layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SessionOptions::default();
        assert_eq!(opts.context_window, 4096);
        assert_eq!(opts.watchdog, Duration::from_millis(10_000));
        assert!(opts.use_acceleration);
        assert_eq!(opts.projector_extension, ".mmproj");
        assert!(opts.acceleration.is_available());
    }

    #[test]
    fn test_context_shift_always_off() {
        let opts = SessionOptions::default().with_context_window(8192);
        let params = opts.context_params();
        assert!(!params.context_shift);
        assert_eq!(params.context_window, 8192);
        assert_eq!(params.gpu_layers, 0);
    }

    #[test]
    fn test_hint_serialized_tagged() {
        let hint = AccelerationHint::unavailable("no GPU backend on this target");
        let json = serde_json::to_value(&hint).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "no GPU backend on this target");
    }
}
