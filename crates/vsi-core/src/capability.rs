use serde::{Deserialize, Serialize};

/// Engine-reported description of the multimodal features it supports.
///
/// Opaque: the engine contract guarantees no structure, so the payload is
/// kept as raw JSON and handed back to the caller untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityDescriptor(serde_json::Value);

impl CapabilityDescriptor {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Convenience lookup for engines that report a JSON object.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

impl From<serde_json::Value> for CapabilityDescriptor {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_opaque_roundtrip_shape() {
        let caps = CapabilityDescriptor::new(json!({ "vision": true, "audio": false }));
        assert_eq!(caps.get("vision"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&caps).unwrap(), json!({ "vision": true, "audio": false }));
    }

    #[test]
    fn test_null_payload_allowed() {
        let caps = CapabilityDescriptor::default();
        assert!(caps.as_value().is_null());
        assert_eq!(caps.get("vision"), None);
    }
}
