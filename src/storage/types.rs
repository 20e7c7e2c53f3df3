use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::types::ComparisonResult;
use crate::error_handling::types::StorageError;

/// Ordered comparison history, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog(Vec<ComparisonResult>);

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates an untyped payload: it must be an array whose every element
    /// is a well-formed comparison record.
    pub fn from_payload(payload: Value) -> Result<Self, StorageError> {
        let items = match payload {
            Value::Array(items) => items,
            other => {
                return Err(StorageError::InvalidHistoryShape(format!(
                    "expected an array, got {}",
                    json_kind(&other)
                )))
            }
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| {
                    StorageError::InvalidHistoryShape(format!("entry {}: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(HistoryLog)
    }

    /// Returns a new log with `record` in front.
    pub fn prepended(&self, record: ComparisonResult) -> Self {
        let mut entries = Vec::with_capacity(self.0.len() + 1);
        entries.push(record);
        entries.extend(self.0.iter().cloned());
        HistoryLog(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[ComparisonResult] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComparisonResult> {
        self.0.iter()
    }
}

impl From<Vec<ComparisonResult>> for HistoryLog {
    fn from(entries: Vec<ComparisonResult>) -> Self {
        HistoryLog(entries)
    }
}

impl IntoIterator for HistoryLog {
    type Item = ComparisonResult;
    type IntoIter = std::vec::IntoIter<ComparisonResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: u64) -> Value {
        json!({
            "id": id,
            "timestamp": "2026-01-02T03:04:05Z",
            "sourceImageReference": "https://cdn/src.png",
            "providerAOutcome": {"status": "success", "resultImageReference": "https://cdn/a.png"},
            "providerBOutcome": {"status": "failure", "message": "Unknown error"},
            "requestedDimensions": {"width": 1024, "height": 768},
            "resolvedDescriptorA": "4:3",
            "resolvedDescriptorB": "landscape_4_3"
        })
    }

    #[test]
    fn test_from_payload_accepts_arrays() {
        let log = HistoryLog::from_payload(json!([entry(2), entry(1)])).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].id(), 2);
        assert!(HistoryLog::from_payload(json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_from_payload_rejects_non_arrays() {
        for payload in [json!({"a": 1}), json!("x"), json!(3), Value::Null] {
            assert!(matches!(
                HistoryLog::from_payload(payload),
                Err(StorageError::InvalidHistoryShape(_))
            ));
        }
    }

    #[test]
    fn test_from_payload_rejects_malformed_entries() {
        let mut bad = entry(1);
        bad["providerAOutcome"] = json!({"status": "pending"});
        let err = HistoryLog::from_payload(json!([entry(2), bad])).unwrap_err();
        match err {
            StorageError::InvalidHistoryShape(msg) => assert!(msg.starts_with("entry 1")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_prepended_leaves_source_log_untouched() {
        let log = HistoryLog::from_payload(json!([entry(1)])).unwrap();
        let newer = HistoryLog::from_payload(json!([entry(2)])).unwrap();
        let combined = log.prepended(newer.entries()[0].clone());
        assert_eq!(log.len(), 1);
        let ids: Vec<u64> = combined.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
