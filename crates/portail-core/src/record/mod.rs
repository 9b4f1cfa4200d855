//! Bulletin records and their codec.
//!
//! The store hands out untyped field maps ([`RawEntry`]). Each record kind
//! implements [`Document`] to turn such a map into a validated value and
//! back. Decoding only reports failures; what to do with a bad entry is the
//! caller's decision.

mod event;
pub(crate) mod fields;
mod news;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::types::{Collection, DocumentId};

pub use event::Event;
pub use news::News;

/// An untyped field map, as stored and as delivered in snapshots.
pub type RawEntry = serde_json::Map<String, serde_json::Value>;

/// Body used when a record is created or stored without one.
pub const DEFAULT_BODY: &str = "Aucune description n'a été fournie.";

/// The kinds of bulletin records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Event,
    News,
}

impl RecordKind {
    /// The collection records of this kind live in.
    pub fn collection(&self) -> Collection {
        match self {
            RecordKind::Event => Collection::events(),
            RecordKind::News => Collection::news(),
        }
    }

    /// The kind stored in `collection`, if it holds bulletin records.
    pub fn from_collection(collection: &Collection) -> Option<Self> {
        match collection.as_str() {
            Collection::EVENTS => Some(RecordKind::Event),
            Collection::NEWS => Some(RecordKind::News),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Event => "event",
            RecordKind::News => "news",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed record that can be decoded from and encoded to a [`RawEntry`].
///
/// `decode(doc.id().cloned(), &doc.encode())` yields `doc` again for every
/// valid record.
pub trait Document: Clone + fmt::Debug + Send + Sync + 'static {
    /// The record kind this type decodes.
    const KIND: RecordKind;

    /// Decode a raw entry. `id` is the store-assigned identity, if known.
    fn decode(id: Option<DocumentId>, raw: &RawEntry) -> Result<Self, DecodeError>;

    /// Encode the fields this codec owns. The id is not part of the payload.
    fn encode(&self) -> RawEntry;

    /// The store-assigned id, absent before the first round trip.
    fn id(&self) -> Option<&DocumentId>;

    fn title(&self) -> &str;
}

/// A record of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Event(Event),
    News(News),
}

impl Record {
    /// Decode a raw entry as a record of the given kind.
    pub fn decode(
        kind: RecordKind,
        id: Option<DocumentId>,
        raw: &RawEntry,
    ) -> Result<Self, DecodeError> {
        match kind {
            RecordKind::Event => Event::decode(id, raw).map(Record::Event),
            RecordKind::News => News::decode(id, raw).map(Record::News),
        }
    }

    pub fn encode(&self) -> RawEntry {
        match self {
            Record::Event(event) => event.encode(),
            Record::News(news) => news.encode(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Event(_) => RecordKind::Event,
            Record::News(_) => RecordKind::News,
        }
    }

    pub fn id(&self) -> Option<&DocumentId> {
        match self {
            Record::Event(event) => event.id(),
            Record::News(news) => news.id(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Record::Event(event) => event.title(),
            Record::News(news) => news.title(),
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Record::Event(event) => event.body(),
            Record::News(news) => news.body(),
        }
    }
}

impl From<Event> for Record {
    fn from(event: Event) -> Self {
        Record::Event(event)
    }
}

impl From<News> for Record {
    fn from(news: News) -> Self {
        Record::News(news)
    }
}
