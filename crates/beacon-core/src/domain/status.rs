//! Status records as returned by the `statuses` operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One user's latest status.
///
/// Fields are read leniently: a number or boolean is kept as its text and
/// `null` reads as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: String,
    /// As sent by the backend; usually RFC 3339.
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: String,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl StatusRecord {
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// The shared board: everyone's latest status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusBoard {
    #[serde(default)]
    pub statuses: Vec<StatusRecord>,
}

impl StatusBoard {
    /// Read a board out of a `statuses` payload.
    ///
    /// A missing `statuses` key is an empty board; entries that are not
    /// objects are skipped.
    pub fn from_data(data: &serde_json::Value) -> Self {
        let statuses = data
            .get("statuses")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        Self { statuses }
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Human relative time: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn time_ago(timestamp: &str, now: DateTime<Utc>) -> String {
    let Ok(then) = DateTime::parse_from_rfc3339(timestamp) else {
        return "unknown".to_string();
    };
    let minutes = (now - then.with_timezone(&Utc)).num_minutes();

    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn board_reads_statuses() {
        let data = json!({
            "statuses": [
                {"name": "ana", "status": "coding", "timestamp": "2024-01-01T12:00:00.000Z"},
                {"name": "bo", "status": "lunch"},
                "garbage"
            ]
        });
        let board = StatusBoard::from_data(&data);
        assert_eq!(board.len(), 2);
        assert_eq!(board.statuses[0].name, "ana");
        assert_eq!(board.statuses[1].timestamp, "");
    }

    #[test]
    fn scalar_fields_are_kept_as_text() {
        let data = json!({
            "statuses": [
                {"name": "ana", "status": 42, "timestamp": 1704110400000u64},
                {"name": null, "status": true}
            ]
        });
        let board = StatusBoard::from_data(&data);
        assert_eq!(board.len(), 2);
        assert_eq!(board.statuses[0].status, "42");
        assert_eq!(board.statuses[0].timestamp, "1704110400000");
        assert_eq!(board.statuses[1].name, "");
        assert_eq!(board.statuses[1].status, "true");
    }

    #[test]
    fn missing_statuses_is_empty() {
        assert!(StatusBoard::from_data(&json!({"ok": true})).is_empty());
        assert!(StatusBoard::from_data(&json!("text")).is_empty());
    }

    #[rstest]
    #[case("2024-01-01T11:59:30Z", "just now")]
    #[case("2024-01-01T11:55:00Z", "5m ago")]
    #[case("2024-01-01T09:00:00Z", "3h ago")]
    #[case("2023-12-30T12:00:00Z", "2d ago")]
    #[case("2024-01-01T12:05:00Z", "just now")]
    #[case("yesterday-ish", "unknown")]
    fn relative_times(#[case] ts: &str, #[case] expected: &str) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(ts, now), expected);
    }

    #[test]
    fn parsed_timestamp_handles_offsets() {
        let rec = StatusRecord {
            timestamp: "2024-01-01T13:00:00+01:00".to_string(),
            ..Default::default()
        };
        assert_eq!(
            rec.parsed_timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
        );
    }
}
