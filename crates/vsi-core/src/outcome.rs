use serde::Serialize;
use uuid::Uuid;

use crate::capability::CapabilityDescriptor;
use crate::notes::{NoteKind, Notes};
use crate::timing::Timings;

/// Result of one initialization attempt. Immutable once built.
///
/// `ok == true` means the projector is attached and enabled on the context;
/// `ok == false` means it is not, and `notes` says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    attempt: Uuid,
    ok: bool,
    notes: Notes,
    capabilities: Option<CapabilityDescriptor>,
    timings: Timings,
}

impl SessionOutcome {
    pub fn success(
        attempt: Uuid,
        notes: Notes,
        capabilities: CapabilityDescriptor,
        timings: Timings,
    ) -> Self {
        Self {
            attempt,
            ok: true,
            notes,
            capabilities: Some(capabilities),
            timings,
        }
    }

    pub fn failure(attempt: Uuid, notes: Notes, timings: Timings) -> Self {
        Self {
            attempt,
            ok: false,
            notes,
            capabilities: None,
            timings,
        }
    }

    /// Correlates this outcome with the `attempt` field of log events.
    pub fn attempt(&self) -> Uuid {
        self.attempt
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn notes(&self) -> &Notes {
        &self.notes
    }

    pub fn capabilities(&self) -> Option<&CapabilityDescriptor> {
        self.capabilities.as_ref()
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// First fatal note, i.e. the reason the attempt failed.
    pub fn failure_kind(&self) -> Option<NoteKind> {
        self.notes.iter().map(|n| n.kind).find(|k| k.is_fatal())
    }

    /// Pretty JSON for support diagnostics.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
