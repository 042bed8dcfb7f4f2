//! Data model for vision session initialization.
//!
//! A vision session is an inference engine context extended with a vision
//! projector. This crate holds everything describing an attempt to attach
//! one: the projector locator, session options, the ordered diagnostic
//! notes, phase timings, and the final outcome handed back to the caller.
//!
//! Zero I/O. The attach protocol itself lives in `vsi-session`.

pub mod capability;
pub mod constants;
pub mod notes;
pub mod options;
pub mod outcome;
pub mod projector;
pub mod timing;

pub use capability::CapabilityDescriptor;
pub use constants::{
    DEFAULT_CONTEXT_WINDOW, DEFAULT_GPU_LAYERS, DEFAULT_RELEASE_TIMEOUT_MS, DEFAULT_WATCHDOG_MS,
    INIT_TIMING_KEY, PROJECTOR_EXTENSION,
};
pub use notes::{Note, NoteKind, Notes};
pub use options::{AccelerationHint, ContextParams, SessionOptions};
pub use outcome::SessionOutcome;
pub use projector::ProjectorRef;
pub use timing::Timings;
