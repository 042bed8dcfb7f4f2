//! Attach a vision projector to an engine context under a watchdog.
//!
//! The protocol, in order:
//!
//! 1. Reject an empty projector locator.
//! 2. Note (but tolerate) an unexpected extension or a failed existence probe.
//!    The engine's attach is the authoritative check.
//! 3. Race attach against the watchdog deadline. An attach that lands after
//!    the deadline is released again from its detached task.
//! 4. Confirm multimodal support actually came up, then read capabilities.
//!    Both queries share the watchdog bound.
//!
//! Every exit that does not end fully enabled releases the projector before
//! returning, including the early exits where attach was never issued.
//! Nothing is raised to the caller: the outcome's notes carry the story.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;
use vsi_core::{
    AccelerationHint, CapabilityDescriptor, INIT_TIMING_KEY, Note, NoteKind, Notes, ProjectorRef,
    SessionOptions, SessionOutcome, Timings,
};

use crate::engine::SharedContext;
use crate::guard::{ReleaseGuard, release_bounded};
use crate::probe::{FsProbe, ResourceProbe};
use crate::watchdog::{Race, isolated, race_deadline};

/// Marker for an attempt that ended early. The reason is already in the notes.
struct Aborted;

pub struct VisionInitializer {
    options: SessionOptions,
    probe: Arc<dyn ResourceProbe>,
}

impl Default for VisionInitializer {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl VisionInitializer {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            probe: Arc::new(FsProbe),
        }
    }

    pub fn with_probe(mut self, probe: impl ResourceProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Run the full protocol against `context`. Never fails; see the
    /// outcome's `ok` flag and notes.
    ///
    /// Each call starts from scratch and assumes nothing about earlier
    /// calls on the same context. Do not run two initializations on one
    /// context at the same time.
    pub async fn initialize(&self, context: &SharedContext, projector: &ProjectorRef) -> SessionOutcome {
        self.initialize_since(context, projector, Instant::now()).await
    }

    /// As [`initialize`](Self::initialize), with `init_ms` measured from
    /// `started` instead of from the call.
    pub(crate) async fn initialize_since(
        &self,
        context: &SharedContext,
        projector: &ProjectorRef,
        started: Instant,
    ) -> SessionOutcome {
        let attempt = Uuid::new_v4();
        let span = tracing::info_span!("vision_init", %attempt, projector = %projector);
        self.run(attempt, context, projector, started)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        attempt: Uuid,
        context: &SharedContext,
        projector: &ProjectorRef,
        started: Instant,
    ) -> SessionOutcome {
        tracing::info!("initializing vision session");
        let guard = ReleaseGuard::arm(context, self.options.release_timeout);
        let mut notes = Notes::new();
        let mut timings = Timings::new();

        match self.attach(context, projector, &mut notes).await {
            Ok(capabilities) => {
                guard.disarm();
                timings.record(INIT_TIMING_KEY, started.elapsed());
                if let AccelerationHint::Unavailable { reason } = &self.options.acceleration {
                    notes.push(Note::new(
                        NoteKind::AccelerationFallback,
                        format!("hardware acceleration unavailable ({reason}); using CPU"),
                    ));
                }
                tracing::info!(
                    init_ms = timings.get(INIT_TIMING_KEY),
                    notes = notes.len(),
                    "vision session ready"
                );
                SessionOutcome::success(attempt, notes, capabilities, timings)
            }
            Err(Aborted) => {
                guard.release().await;
                SessionOutcome::failure(attempt, notes, timings)
            }
        }
    }

    async fn attach(
        &self,
        context: &SharedContext,
        projector: &ProjectorRef,
        notes: &mut Notes,
    ) -> Result<CapabilityDescriptor, Aborted> {
        if projector.is_empty() {
            return Err(abort(notes, NoteKind::MissingReference));
        }
        if !projector.has_extension(&self.options.projector_extension) {
            tracing::debug!(expected = %self.options.projector_extension, "unexpected projector extension");
            notes.push(NoteKind::SuspiciousExtension);
        }
        match tokio::time::timeout(self.options.watchdog, self.probe.exists(projector)).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                tracing::debug!("projector not found by probe");
                notes.push(NoteKind::ResourceMissing);
            }
            Ok(Err(e)) => {
                tracing::debug!("projector probe failed: {e}");
                notes.push(NoteKind::ResourceMissing);
            }
            Err(_) => {
                tracing::debug!("projector probe did not answer in time");
                notes.push(NoteKind::ResourceMissing);
            }
        }

        let ctx = Arc::clone(context);
        let locator = projector.as_str().to_owned();
        let use_acceleration = self.options.use_acceleration;
        let late_ctx = Arc::clone(context);
        let release_timeout = self.options.release_timeout;
        let race = race_deadline(
            async move { ctx.attach_projector(&locator, use_acceleration).await },
            self.options.watchdog,
            move |late: anyhow::Result<bool>| async move {
                // the attempt already failed; undo an attach that landed after the deadline
                if let Ok(true) = late {
                    tracing::warn!("projector attached after the watchdog tripped; releasing");
                    release_bounded(late_ctx, release_timeout).await;
                }
            },
        )
        .await;
        match race {
            Race::Settled(Ok(true)) => tracing::debug!("projector attached"),
            Race::Settled(Ok(false)) => return Err(abort(notes, NoteKind::AttachFailed)),
            Race::Settled(Err(e)) => return Err(abort(notes, engine_fault("attach", e))),
            Race::Faulted(msg) => return Err(abort(notes, fault_note("attach", &msg))),
            Race::Expired => {
                tracing::warn!(watchdog = ?self.options.watchdog, "attach did not answer in time");
                return Err(abort(notes, NoteKind::WatchdogTripped));
            }
        }

        let ctx = Arc::clone(context);
        match self.bounded(isolated(async move { ctx.is_multimodal_enabled().await })).await {
            Ok(Ok(Ok(true))) => {}
            Ok(Ok(Ok(false))) => return Err(abort(notes, NoteKind::NotEnabled)),
            Ok(Ok(Err(e))) => return Err(abort(notes, engine_fault("enablement check", e))),
            Ok(Err(msg)) => return Err(abort(notes, fault_note("enablement check", &msg))),
            Err(waited) => return Err(abort(notes, silent_note("enablement check", waited))),
        }

        let ctx = Arc::clone(context);
        match self.bounded(isolated(async move { ctx.multimodal_capabilities().await })).await {
            Ok(Ok(Ok(capabilities))) => Ok(capabilities),
            Ok(Ok(Err(e))) => Err(abort(notes, engine_fault("capability query", e))),
            Ok(Err(msg)) => Err(abort(notes, fault_note("capability query", &msg))),
            Err(waited) => Err(abort(notes, silent_note("capability query", waited))),
        }
    }

    /// Limit a post-attach engine query to the watchdog. `Err` carries the
    /// time waited.
    async fn bounded<T>(&self, query: impl Future<Output = T>) -> Result<T, Duration> {
        tokio::time::timeout(self.options.watchdog, query)
            .await
            .map_err(|_| self.options.watchdog)
    }
}

/// Run the protocol with the filesystem probe.
pub async fn initialize(
    context: &SharedContext,
    projector: &ProjectorRef,
    options: &SessionOptions,
) -> SessionOutcome {
    VisionInitializer::new(options.clone())
        .initialize(context, projector)
        .await
}

fn abort(notes: &mut Notes, note: impl Into<Note>) -> Aborted {
    let note = note.into();
    tracing::warn!(kind = ?note.kind, "vision session aborted: {note}");
    notes.push(note);
    Aborted
}

fn engine_fault(phase: &str, e: anyhow::Error) -> Note {
    fault_note(phase, &format!("{e:#}"))
}

fn silent_note(phase: &str, waited: Duration) -> Note {
    fault_note(phase, &format!("no answer within {waited:?}"))
}

fn fault_note(phase: &str, detail: &str) -> Note {
    Note::new(NoteKind::EngineFault, format!("engine error during {phase}: {detail}"))
}
