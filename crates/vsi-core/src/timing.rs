use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Elapsed milliseconds per completed phase.
///
/// A phase is only ever recorded after it finished successfully, so an
/// absent key means the phase did not complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timings(BTreeMap<String, u64>);

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, phase: &str, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.0.insert(phase.to_string(), ms);
    }

    pub fn get(&self, phase: &str) -> Option<u64> {
        self.0.get(phase).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
