use gossipbench::payload::PAYLOAD_FIELD;
use serde::{Deserialize, Serialize};

/// Body of `POST /publish`
///
/// Serializes as `{"test-meta": "<payload>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    #[serde(rename = "test-meta")]
    pub test_meta: String,
}

impl PublishRequest {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            test_meta: payload.into(),
        }
    }

    /// Name of the JSON field carrying the payload
    pub const fn field() -> &'static str {
        PAYLOAD_FIELD
    }
}

/// One entry of a node's `/list` response
///
/// Only `Addr` is required; the remaining fields default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Member {
    pub addr: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub private_data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_request_field_name() {
        let json = serde_json::to_value(PublishRequest::new("abc")).unwrap();
        assert_eq!(json, serde_json::json!({ "test-meta": "abc" }));
        assert_eq!(PublishRequest::field(), "test-meta");
    }

    #[test]
    fn test_member_parsing() {
        let json = r#"[
            {"Addr": "10.244.0.5", "Port": 8000, "Mac": "aa:bb:cc:dd:ee:ff", "Name": "gossip-0", "PrivateData": "test-data"},
            {"Addr": "10.244.0.6"}
        ]"#;

        let members: Vec<Member> = serde_json::from_str(json).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "gossip-0");
        assert_eq!(members[0].port, 8000);
        assert_eq!(members[1].addr, "10.244.0.6");
        assert_eq!(members[1].port, 0);
    }

    #[test]
    fn test_member_requires_addr() {
        let json = r#"[{"Name": "gossip-0"}]"#;
        assert!(serde_json::from_str::<Vec<Member>>(json).is_err());
    }
}
