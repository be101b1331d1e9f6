// Data model for the notes collection

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A user-authored note.
///
/// Only the store creates or mutates notes. Everything outside the crate
/// gets read access through the getters, or builds notes by decoding a
/// persisted collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: String,
    title: String,
    content: String,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
}

impl Note {
    pub(crate) fn new(id: String, title: String, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace title and content, moving `updated_at` forward.
    ///
    /// `updated_at` never goes below `created_at` or below its previous value,
    /// even if the clock steps backwards.
    pub(crate) fn revise(&mut self, title: String, content: String, now: DateTime<Utc>) {
        self.title = title;
        self.content = content;
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }

    /// Repair a record whose `updated_at` precedes `created_at`.
    /// Returns true when the record was changed.
    pub(crate) fn repair_timestamps(&mut self) -> bool {
        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
            return true;
        }
        false
    }
}

/// Current time truncated to millisecond precision, the resolution
/// timestamps are persisted with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Generate a fresh note id (UUID v7, time-ordered).
pub fn new_note_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Serde helpers for note timestamps.
///
/// Written as ISO-8601 with millisecond precision. Read from an ISO-8601
/// string (with or without offset, or a bare date, both taken as UTC) or a
/// count of milliseconds since the epoch, integral or not.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Millis(ms) => from_millis(ms).map_err(D::Error::custom),
            RawTimestamp::Float(ms) => {
                if !ms.is_finite() || ms.abs() > i64::MAX as f64 {
                    return Err(D::Error::custom(format!("timestamp out of range: {}", ms)));
                }
                from_millis(ms.round() as i64).map_err(D::Error::custom)
            }
            RawTimestamp::Text(text) => parse_text(&text)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {:?}", text))),
        }
    }

    fn from_millis(ms: i64) -> Result<DateTime<Utc>, String> {
        DateTime::from_timestamp_millis(ms).ok_or_else(|| format!("timestamp out of range: {}", ms))
    }

    fn parse_text(text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
pub(crate) fn note_at(id: &str, title: &str, created_ms: i64) -> Note {
    let ts = DateTime::from_timestamp_millis(created_ms).expect("valid test timestamp");
    Note::new(id.to_string(), title.to_string(), String::new(), ts)
}
