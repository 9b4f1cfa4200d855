//! News records.

use serde::Serialize;
use serde_json::Value;

use super::{DEFAULT_BODY, Document, RawEntry, RecordKind, fields};
use crate::error::{DecodeError, Error, InvalidInputError};
use crate::types::DocumentId;

/// A news post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct News {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<DocumentId>,
    title: String,
    body: String,
}

impl News {
    /// Create a news post that has not been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is empty or blank. A missing body is
    /// replaced by [`DEFAULT_BODY`].
    pub fn new(title: impl Into<String>, body: Option<String>) -> Result<Self, Error> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(InvalidInputError::Record {
                reason: "a news post needs a title".to_string(),
            }
            .into());
        }

        Ok(Self {
            id: None,
            title,
            body: body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
        })
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Document for News {
    const KIND: RecordKind = RecordKind::News;

    fn decode(id: Option<DocumentId>, raw: &RawEntry) -> Result<Self, DecodeError> {
        Ok(Self {
            id,
            title: fields::title(Self::KIND, raw)?,
            body: fields::body(Self::KIND, raw)?,
        })
    }

    fn encode(&self) -> RawEntry {
        let mut raw = RawEntry::new();
        raw.insert(fields::TITLE.to_string(), Value::String(self.title.clone()));
        raw.insert(fields::BODY.to_string(), Value::String(self.body.clone()));
        raw
    }

    fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    fn title(&self) -> &str {
        &self.title
    }
}
