//! Wire form of an [`ArticleRecord`].
//!
//! A [`MessageBody`] holds only strings, so it can be encoded as JSON and
//! handed to any queue transport without further conversion.
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::ArticleRecord;

/// String-only representation of an article, one queue message each.
///
/// Absent fields are omitted from the JSON encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl MessageBody {
    /// Compact JSON encoding used as the queue message body.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Anything that can be rendered as a [`MessageBody`].
///
/// Serializing an existing `MessageBody` returns it unchanged.
pub trait IntoMessage {
    fn into_message(self) -> MessageBody;
}

impl IntoMessage for ArticleRecord {
    fn into_message(self) -> MessageBody {
        MessageBody {
            url: self.url,
            pub_date: self.publication_time.map(format_pub_date),
            tags: Some(self.tags),
        }
    }
}

impl IntoMessage for &ArticleRecord {
    fn into_message(self) -> MessageBody {
        self.clone().into_message()
    }
}

impl IntoMessage for MessageBody {
    fn into_message(self) -> MessageBody {
        self
    }
}

/// Converts a record (or an already-converted body) into its message form.
pub fn serialize(record: impl IntoMessage) -> MessageBody {
    record.into_message()
}

/// ISO-8601 with an explicit `+00:00` offset. Sub-second precision is
/// rendered in microseconds, and only when non-zero.
pub fn format_pub_date(at: DateTime<Utc>) -> String {
    let precision = if at.nanosecond() / 1_000 == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    at.to_rfc3339_opts(precision, false)
}
