//! Event records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{DEFAULT_BODY, Document, RawEntry, RecordKind, fields};
use crate::error::{DecodeError, Error, InvalidInputError};
use crate::types::DocumentId;

/// A scheduled team event.
///
/// `end_date >= start_date` is expected but not enforced; the store is
/// trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<DocumentId>,
    title: String,
    body: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl Event {
    /// Create an event that has not been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is empty or blank.
    pub fn new(
        title: impl Into<String>,
        body: Option<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(InvalidInputError::Record {
                reason: "an event needs a title".to_string(),
            }
            .into());
        }

        Ok(Self {
            id: None,
            title,
            body: body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            start_date,
            end_date,
        })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }
}

impl Document for Event {
    const KIND: RecordKind = RecordKind::Event;

    fn decode(id: Option<DocumentId>, raw: &RawEntry) -> Result<Self, DecodeError> {
        Ok(Self {
            id,
            title: fields::title(Self::KIND, raw)?,
            body: fields::body(Self::KIND, raw)?,
            start_date: fields::timestamp(Self::KIND, raw, fields::START_DATE)?,
            end_date: fields::timestamp(Self::KIND, raw, fields::END_DATE)?,
        })
    }

    fn encode(&self) -> RawEntry {
        let mut raw = RawEntry::new();
        raw.insert(fields::TITLE.to_string(), Value::String(self.title.clone()));
        raw.insert(fields::BODY.to_string(), Value::String(self.body.clone()));
        raw.insert(
            fields::START_DATE.to_string(),
            fields::encode_timestamp(&self.start_date),
        );
        raw.insert(
            fields::END_DATE.to_string(),
            fields::encode_timestamp(&self.end_date),
        );
        raw
    }

    fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    fn title(&self) -> &str {
        &self.title
    }
}
