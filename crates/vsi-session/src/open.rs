use tokio::time::Instant;
use vsi_core::{ProjectorRef, SessionOutcome};

use crate::engine::{EngineFactory, SharedContext};
use crate::error::OpenError;
use crate::initializer::VisionInitializer;

/// An opened context together with the outcome of its projector attach.
/// The context is usable either way; `outcome.ok()` says whether it can
/// see images.
pub struct VisionSession {
    pub context: SharedContext,
    pub outcome: SessionOutcome,
}

/// Open a base context for `model` and attach `projector` to it.
///
/// The context is opened with the initializer's options, context shifting
/// off. `init_ms` in the outcome includes the open.
pub async fn open_vision_session(
    factory: &dyn EngineFactory,
    model: &str,
    projector: &ProjectorRef,
    initializer: &VisionInitializer,
) -> Result<VisionSession, OpenError> {
    if model.trim().is_empty() {
        return Err(OpenError::EmptyModel);
    }
    let started = Instant::now();
    let params = initializer.options().context_params();
    tracing::info!(
        model,
        context_window = params.context_window,
        gpu_layers = params.gpu_layers,
        "opening engine context"
    );
    let context = factory.open(model, &params).await?;
    let outcome = initializer
        .initialize_since(&context, projector, started)
        .await;
    Ok(VisionSession { context, outcome })
}
