//! Diagnostic notes collected while a session initializes.
//!
//! Notes are the only failure channel of the protocol: every anomaly, fatal
//! or not, lands here in detection order. [`Notes`] is append-only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a note reports. Machine-readable counterpart of the note text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// Projector locator was empty.
    MissingReference,
    /// Locator does not follow the projector naming convention.
    SuspiciousExtension,
    /// Existence probe said no, or could not tell.
    ResourceMissing,
    /// Engine answered the attach call with a refusal.
    AttachFailed,
    /// Engine never answered the attach call in time.
    WatchdogTripped,
    /// Attach was accepted but multimodal support did not come up.
    NotEnabled,
    /// Engine raised an error (or its task died) mid-protocol.
    EngineFault,
    /// Informational: accelerated paths unavailable, running on CPU.
    AccelerationFallback,
}

impl NoteKind {
    /// Whether a note of this kind ends the attempt.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            NoteKind::MissingReference
                | NoteKind::AttachFailed
                | NoteKind::WatchdogTripped
                | NoteKind::NotEnabled
                | NoteKind::EngineFault
        )
    }

    /// Canonical text for kinds that carry no detail.
    pub fn default_message(self) -> &'static str {
        match self {
            NoteKind::MissingReference => "no projector reference provided",
            NoteKind::SuspiciousExtension => "suspicious projector extension",
            NoteKind::ResourceMissing => "projector resource missing",
            NoteKind::AttachFailed => "attach returned failure",
            NoteKind::WatchdogTripped => "first-response watchdog tripped",
            NoteKind::NotEnabled => "multimodal not enabled after attach",
            NoteKind::EngineFault => "unexpected engine error",
            NoteKind::AccelerationFallback => "hardware acceleration unavailable; using CPU",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub kind: NoteKind,
    pub message: String,
}

impl Note {
    pub fn new(kind: NoteKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<NoteKind> for Note {
    fn from(kind: NoteKind) -> Self {
        Self::new(kind, kind.default_message())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ordered, append-only note sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notes(Vec<Note>);

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: impl Into<Note>) {
        self.0.push(note.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.0.iter()
    }

    pub fn contains(&self, kind: NoteKind) -> bool {
        self.0.iter().any(|n| n.kind == kind)
    }

    pub fn last(&self) -> Option<&Note> {
        self.0.last()
    }

    /// Note texts in detection order.
    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|n| n.message.as_str()).collect()
    }

    pub fn kinds(&self) -> Vec<NoteKind> {
        self.0.iter().map(|n| n.kind).collect()
    }
}

impl<'a> IntoIterator for &'a Notes {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
