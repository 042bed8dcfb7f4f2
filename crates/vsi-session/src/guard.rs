//! Scoped projector release.
//!
//! A [`ReleaseGuard`] is armed before any attach work starts. The success
//! path disarms it; every other exit awaits [`ReleaseGuard::release`]. If
//! the initialize future is dropped mid-flight the guard's `Drop` hands the
//! release to the runtime instead.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::SharedContext;

pub struct ReleaseGuard {
    context: Option<SharedContext>,
    timeout: Duration,
}

impl ReleaseGuard {
    pub fn arm(context: &SharedContext, timeout: Duration) -> Self {
        Self {
            context: Some(Arc::clone(context)),
            timeout,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.context.is_some()
    }

    /// Keep the projector: the session came up fully enabled.
    pub fn disarm(mut self) {
        self.context = None;
    }

    /// Release the projector, bounded by the guard's timeout. Failures are
    /// logged and swallowed.
    pub async fn release(mut self) {
        if let Some(context) = self.context.take() {
            release_bounded(context, self.timeout).await;
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!("initialization abandoned mid-flight; releasing projector in background");
                handle.spawn(release_bounded(context, self.timeout));
            }
            Err(_) => {
                tracing::warn!("initialization abandoned outside a runtime; projector release skipped");
            }
        }
    }
}

pub(crate) async fn release_bounded(context: SharedContext, timeout: Duration) {
    // own task: a panicking release must not unwind into initialize
    let task = tokio::spawn(async move { context.release_projector().await });
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(()))) => tracing::debug!("projector released"),
        Ok(Ok(Err(e))) => tracing::warn!("projector release failed: {e:#}"),
        Ok(Err(e)) => tracing::warn!("projector release task failed: {e}"),
        Err(_) => tracing::warn!("projector release timed out after {timeout:?}"),
    }
}
