/// Default context window (tokens) for a vision session
pub const DEFAULT_CONTEXT_WINDOW: u32 = 4096;

/// First-response watchdog deadline for the projector attach (ms)
pub const DEFAULT_WATCHDOG_MS: u64 = 10_000;

/// Upper bound on a single release attempt during cleanup (ms)
pub const DEFAULT_RELEASE_TIMEOUT_MS: u64 = 2_000;

/// Layers offloaded to an accelerator when the base context is opened
pub const DEFAULT_GPU_LAYERS: u32 = 0;

/// Expected suffix of a vision projector resource
pub const PROJECTOR_EXTENSION: &str = ".mmproj";

/// Timing key for the attach-through-enable sequence
pub const INIT_TIMING_KEY: &str = "init_ms";
