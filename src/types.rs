use serde::{Deserialize, Serialize};

/// Payload plus HTTP status and an ISO-8601 timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub data: T,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ResultEnvelope<T> {
    pub fn new(data: T, status: u16) -> Self {
        Self {
            data,
            status,
            message: None,
            timestamp: timestamp_now(),
        }
    }
}

/// Current UTC time as `2024-01-02T03:04:05.678Z`.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_iso8601_utc_with_millis() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        assert_eq!(ts.len(), "2024-01-02T03:04:05.678Z".len());
    }

    #[test]
    fn envelope_serializes_without_empty_message() {
        let envelope = ResultEnvelope::new(serde_json::json!({"id": 1}), 200);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["data"]["id"], 1);
        assert!(value.get("message").is_none());
        assert!(value["timestamp"].is_string());
    }
}
