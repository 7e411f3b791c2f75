//! Shaping helpers shared by the service handlers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Provider timestamp rendered as ISO-8601. Accepts RFC 3339 text or epoch
/// seconds; text that does not parse is kept as given, absence renders as "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

impl Timestamp {
    pub fn from_epoch(secs: f64) -> Option<Self> {
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::<Utc>::from_timestamp(whole as i64, nanos).map(|dt| Self(dt.to_rfc3339()))
    }

    pub fn from_text(raw: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self(dt.with_timezone(&Utc).to_rfc3339());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Self(naive.and_utc().to_rfc3339());
        }
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Timestamp::from_text(&s),
            Value::Number(n) => n.as_f64().and_then(Timestamp::from_epoch).unwrap_or_default(),
            _ => Timestamp::default(),
        })
    }
}

/// Value of tag `key` in a provider tag list, or "".
pub fn tag_value(tags: &[Tag], key: &str) -> String {
    tags.iter().find(|t| t.key == key).map(|t| t.value.clone()).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Tag {
    pub key: String,
    pub value: String,
}
