//! Document reference type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Collection, DocumentId};
use crate::error::{Error, InvalidInputError};

/// A reference to one stored document.
///
/// This is the origin reference carried next to every projected record: it
/// is what a caller hands back to the store to delete or update the item.
/// Format: `<collection>/<id>`
///
/// # Example
///
/// ```
/// use portail_core::DocumentRef;
///
/// let doc = DocumentRef::new("events/4f1c2a9e").unwrap();
/// assert_eq!(doc.collection().as_str(), "events");
/// assert_eq!(doc.id().as_str(), "4f1c2a9e");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentRef {
    collection: Collection,
    id: DocumentId,
}

impl DocumentRef {
    /// Parse a document reference from a `collection/id` string.
    ///
    /// # Errors
    ///
    /// Returns an error if either segment is invalid.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        Self::parse(s.as_ref())
    }

    /// Create a reference from its components.
    pub fn from_parts(collection: Collection, id: DocumentId) -> Self {
        Self { collection, id }
    }

    /// Returns the collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Returns the document id.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    fn parse(s: &str) -> Result<Self, Error> {
        let (collection, id) = s.split_once('/').ok_or_else(|| InvalidInputError::DocumentRef {
            value: s.to_string(),
            reason: "must have format '<collection>/<id>'".to_string(),
        })?;

        let collection = Collection::new(collection).map_err(|_| InvalidInputError::DocumentRef {
            value: s.to_string(),
            reason: format!("invalid collection: {}", collection),
        })?;

        let id = DocumentId::new(id).map_err(|_| InvalidInputError::DocumentRef {
            value: s.to_string(),
            reason: format!("invalid document id: {}", id),
        })?;

        Ok(Self { collection, id })
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl FromStr for DocumentRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for DocumentRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DocumentRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DocumentRef::new(&s).map_err(serde::de::Error::custom)
    }
}
