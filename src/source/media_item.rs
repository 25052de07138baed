//! The item type delivered by the stream.
//!
//! `MediaItem` keeps the `id` the stream de-duplicates on and every other
//! field of the API element untouched, so consumers see exactly what the API
//! returned.  The accessors cover the handful of fields the viewer shows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One media element from a `/media/recent` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique identifier used for de-duplication.
    pub id: String,

    /// All remaining fields, verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// `created_time` is a unix-seconds string in the API payload.
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        let secs = match self.fields.get("created_time")? {
            Value::String(s) => s.parse::<i64>().ok()?,
            Value::Number(n) => n.as_i64()?,
            _ => return None,
        };
        DateTime::from_timestamp(secs, 0)
    }

    pub fn caption(&self) -> Option<&str> {
        self.fields.get("caption")?.get("text")?.as_str()
    }

    pub fn username(&self) -> Option<&str> {
        self.fields.get("user")?.get("username")?.as_str()
    }

    pub fn link(&self) -> Option<&str> {
        self.fields.get("link")?.as_str()
    }

    /// Decode the `data` array of a response body.
    pub fn from_response_body(body: &Value) -> serde_json::Result<Vec<MediaItem>> {
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn keeps_unknown_fields_verbatim() {
        let value = json!({ "id": "42", "type": "image", "likes": { "count": 3 } });
        let item: MediaItem = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(item.id, "42");
        assert_eq!(item.fields.get("type"), Some(&json!("image")));
        assert_eq!(serde_json::to_value(&item).unwrap(), value);
    }

    #[test]
    fn accessors_read_instagram_fields() {
        let item: MediaItem = serde_json::from_value(json!({
            "id": "1",
            "created_time": "1704067200",
            "caption": { "text": "sunset" },
            "user": { "username": "alice" },
            "link": "https://instagram.com/p/1"
        }))
        .unwrap();

        assert_eq!(
            item.created_time(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(item.caption(), Some("sunset"));
        assert_eq!(item.username(), Some("alice"));
        assert_eq!(item.link(), Some("https://instagram.com/p/1"));
    }

    #[test]
    fn missing_or_malformed_fields_are_none() {
        let item = MediaItem::new("1")
            .with_field("created_time", json!("yesterday"))
            .with_field("caption", Value::Null);

        assert!(item.created_time().is_none());
        assert!(item.caption().is_none());
        assert!(item.username().is_none());
        assert!(item.link().is_none());
    }

    #[test]
    fn from_response_body_reads_data_array() {
        let body = json!({ "meta": { "code": 200 }, "data": [{ "id": "1" }, { "id": "2" }] });
        let items = MediaItem::from_response_body(&body).unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn from_response_body_rejects_missing_data_or_id() {
        assert!(MediaItem::from_response_body(&json!({ "meta": {} })).is_err());
        assert!(MediaItem::from_response_body(&json!({ "data": [{ "type": "image" }] })).is_err());
    }
}
