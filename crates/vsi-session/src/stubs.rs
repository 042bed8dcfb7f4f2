//! Scriptable engine, factory and probe for tests.
//!
//! Available under `cfg(test)` and with the `test-utils` feature. Every
//! engine call is counted so tests can assert exactly which collaborator
//! operations a protocol run issued.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use vsi_core::{CapabilityDescriptor, ContextParams, ProjectorRef};

use crate::engine::{EngineContext, EngineFactory, SharedContext};
use crate::probe::ResourceProbe;

/// How the stub answers `attach_projector`.
#[derive(Debug, Clone)]
pub enum AttachBehavior {
    Succeed,
    Refuse,
    /// Never settles.
    Hang,
    /// Settles with the given answer after a delay.
    Delay(Duration, bool),
    Error(String),
    Panic,
}

/// How the stub answers `is_multimodal_enabled`.
#[derive(Debug, Clone)]
pub enum EnableBehavior {
    Enabled,
    Disabled,
    Error(String),
    /// Never answers.
    Hang,
}

/// How the stub answers `release_projector`.
#[derive(Debug, Clone)]
pub enum ReleaseBehavior {
    Succeed,
    Error(String),
    Hang,
    Panic,
}

pub struct StubEngine {
    attach: AttachBehavior,
    enable: EnableBehavior,
    capabilities: Result<serde_json::Value, String>,
    release: ReleaseBehavior,
    attached: AtomicBool,
    attach_calls: AtomicUsize,
    enable_calls: AtomicUsize,
    capability_calls: AtomicUsize,
    release_calls: AtomicUsize,
    late_settlements: AtomicUsize,
    attach_args: Mutex<Vec<(String, bool)>>,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StubEngine {
    /// Happy engine: attach succeeds, multimodal comes up, vision reported.
    pub fn new() -> Self {
        Self {
            attach: AttachBehavior::Succeed,
            enable: EnableBehavior::Enabled,
            capabilities: Ok(json!({ "vision": true, "audio": false })),
            release: ReleaseBehavior::Succeed,
            attached: AtomicBool::new(false),
            attach_calls: AtomicUsize::new(0),
            enable_calls: AtomicUsize::new(0),
            capability_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
            late_settlements: AtomicUsize::new(0),
            attach_args: Mutex::new(Vec::new()),
        }
    }

    pub fn with_attach(mut self, behavior: AttachBehavior) -> Self {
        self.attach = behavior;
        self
    }

    pub fn with_enable(mut self, behavior: EnableBehavior) -> Self {
        self.enable = behavior;
        self
    }

    pub fn with_capabilities(mut self, value: serde_json::Value) -> Self {
        self.capabilities = Ok(value);
        self
    }

    pub fn with_capabilities_error(mut self, message: impl Into<String>) -> Self {
        self.capabilities = Err(message.into());
        self
    }

    pub fn with_release(mut self, behavior: ReleaseBehavior) -> Self {
        self.release = behavior;
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls.load(Ordering::SeqCst)
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn capability_calls(&self) -> usize {
        self.capability_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    /// Delayed attaches that finished after the caller stopped waiting
    /// (counted whenever a `Delay` attach settles).
    pub fn late_settlements(&self) -> usize {
        self.late_settlements.load(Ordering::SeqCst)
    }

    /// `(locator, use_acceleration)` for every attach call, in order.
    pub fn attach_args(&self) -> Vec<(String, bool)> {
        self.attach_args
            .lock()
            .map(|args| args.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EngineContext for StubEngine {
    async fn attach_projector(&self, locator: &str, use_acceleration: bool) -> anyhow::Result<bool> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut args) = self.attach_args.lock() {
            args.push((locator.to_string(), use_acceleration));
        }
        let accepted = match &self.attach {
            AttachBehavior::Succeed => true,
            AttachBehavior::Refuse => false,
            AttachBehavior::Hang => std::future::pending().await,
            AttachBehavior::Delay(delay, answer) => {
                tokio::time::sleep(*delay).await;
                self.late_settlements.fetch_add(1, Ordering::SeqCst);
                *answer
            }
            AttachBehavior::Error(msg) => anyhow::bail!("{msg}"),
            AttachBehavior::Panic => panic!("stub attach panicked"),
        };
        if accepted {
            self.attached.store(true, Ordering::SeqCst);
        }
        Ok(accepted)
    }

    async fn is_multimodal_enabled(&self) -> anyhow::Result<bool> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        match &self.enable {
            EnableBehavior::Enabled => Ok(self.is_attached()),
            EnableBehavior::Disabled => Ok(false),
            EnableBehavior::Error(msg) => anyhow::bail!("{msg}"),
            EnableBehavior::Hang => std::future::pending().await,
        }
    }

    async fn multimodal_capabilities(&self) -> anyhow::Result<CapabilityDescriptor> {
        self.capability_calls.fetch_add(1, Ordering::SeqCst);
        match &self.capabilities {
            Ok(value) => Ok(CapabilityDescriptor::new(value.clone())),
            Err(msg) => anyhow::bail!("{msg}"),
        }
    }

    async fn release_projector(&self) -> anyhow::Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        match &self.release {
            ReleaseBehavior::Succeed => {
                self.attached.store(false, Ordering::SeqCst);
                Ok(())
            }
            ReleaseBehavior::Error(msg) => anyhow::bail!("{msg}"),
            ReleaseBehavior::Hang => std::future::pending().await,
            ReleaseBehavior::Panic => panic!("stub release panicked"),
        }
    }
}

/// Factory handing out one pre-built stub engine.
pub struct StubFactory {
    engine: Option<Arc<StubEngine>>,
    failure: Option<String>,
    opened: Mutex<Vec<(String, ContextParams)>>,
}

impl StubFactory {
    pub fn new(engine: Arc<StubEngine>) -> Self {
        Self {
            engine: Some(engine),
            failure: None,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            engine: None,
            failure: Some(message.into()),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// `(model, params)` for every open call, in order.
    pub fn opened(&self) -> Vec<(String, ContextParams)> {
        self.opened
            .lock()
            .map(|o| o.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EngineFactory for StubFactory {
    async fn open(&self, model: &str, params: &ContextParams) -> anyhow::Result<SharedContext> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push((model.to_string(), *params));
        }
        match (&self.engine, &self.failure) {
            (_, Some(msg)) => anyhow::bail!("{msg}"),
            (Some(engine), None) => Ok(Arc::clone(engine) as SharedContext),
            (None, None) => anyhow::bail!("stub factory has no engine"),
        }
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub enum StubProbe {
    Present,
    Missing,
    Fails,
    /// Never answers.
    Hangs,
}

#[async_trait]
impl ResourceProbe for StubProbe {
    async fn exists(&self, _projector: &ProjectorRef) -> io::Result<bool> {
        match self {
            StubProbe::Present => Ok(true),
            StubProbe::Missing => Ok(false),
            StubProbe::Fails => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "stub probe denied",
            )),
            StubProbe::Hangs => std::future::pending().await,
        }
    }
}
