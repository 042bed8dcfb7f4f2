//! Boundary with the inference engine.
//!
//! The engine is external and untrusted: any call may fail, and attach may
//! never return at all. Errors are opaque `anyhow::Error` values; the
//! initializer only ever stringifies them into notes.

use std::sync::Arc;

use async_trait::async_trait;
use vsi_core::{CapabilityDescriptor, ContextParams};

/// An opened inference context that can host a vision projector.
///
/// One initialization at a time per context. Running two initializers
/// against the same context concurrently is a caller error and is not
/// detected here.
#[async_trait]
pub trait EngineContext: Send + Sync {
    /// Attach the projector at `locator`. `Ok(false)` is a refusal.
    /// May be slow, or hang.
    async fn attach_projector(&self, locator: &str, use_acceleration: bool) -> anyhow::Result<bool>;

    /// Bounded by the caller's watchdog, like attach.
    async fn is_multimodal_enabled(&self) -> anyhow::Result<bool>;

    /// Bounded by the caller's watchdog, like attach.
    async fn multimodal_capabilities(&self) -> anyhow::Result<CapabilityDescriptor>;

    /// Drop any attached projector.
    ///
    /// Must be idempotent: calling it with nothing attached, or twice in a
    /// row, is a no-op. Cleanup relies on this, since it releases even when
    /// attach was never issued.
    async fn release_projector(&self) -> anyhow::Result<()>;
}

pub type SharedContext = Arc<dyn EngineContext>;

/// Opens base inference contexts.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn open(&self, model: &str, params: &ContextParams) -> anyhow::Result<SharedContext>;
}
