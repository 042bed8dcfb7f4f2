//! Watchdog-guarded vision projector attach.
//!
//! Drives an externally owned inference engine context from "opened" to
//! either "vision-enabled" or "vision-absent", never anything in between:
//! attach is raced against a deadline, and the projector is released on
//! every path that does not end fully enabled.
//!
//! The engine is reached only through [`EngineContext`] and
//! [`EngineFactory`]; this crate never loads a model itself.

pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod initializer;
pub mod open;
pub mod probe;
pub mod watchdog;

#[cfg(any(test, feature = "test-utils"))]
pub mod stubs;

pub use engine::{EngineContext, EngineFactory, SharedContext};
pub use error::{ConfigError, OpenError};
pub use guard::ReleaseGuard;
pub use initializer::{VisionInitializer, initialize};
pub use open::{VisionSession, open_vision_session};
pub use probe::{FsProbe, ResourceProbe};
pub use watchdog::{Race, race_deadline};

pub use vsi_core::{
    AccelerationHint, CapabilityDescriptor, ContextParams, Note, NoteKind, Notes, ProjectorRef,
    SessionOptions, SessionOutcome, Timings,
};
