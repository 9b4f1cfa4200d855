//! Query descriptors.
//!
//! A [`QueryDescriptor`] is an immutable description of a filtered, ordered
//! view over one collection. Equality is structural, which is what lets the
//! feed skip a rebind when the same filter is selected again.
//!
//! Stores interpret descriptors through [`QueryDescriptor::evaluate`], so
//! every backend filters and orders the same way.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Error, InvalidInputError};
use crate::record::{RawEntry, fields};
use crate::traits::SnapshotEntry;
use crate::types::{Collection, DocumentRef};

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    LessThan,
    LessThanOrEqual,
    Equal,
    GreaterThanOrEqual,
    GreaterThan,
}

impl Comparison {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::LessThanOrEqual => ordering != Ordering::Greater,
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::GreaterThanOrEqual => ordering != Ordering::Less,
            Comparison::GreaterThan => ordering == Ordering::Greater,
        }
    }
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Timestamp(DateTime<Utc>),
    Text(String),
    Integer(i64),
}

impl FilterValue {
    /// Compare a stored value against this one. `None` when the types differ.
    fn compare(&self, stored: &Value) -> Option<Ordering> {
        match self {
            FilterValue::Timestamp(expected) => {
                fields::parse_timestamp(stored).map(|actual| actual.cmp(expected))
            }
            FilterValue::Text(expected) => stored
                .as_str()
                .map(|actual| actual.cmp(expected.as_str())),
            FilterValue::Integer(expected) => stored.as_i64().map(|actual| actual.cmp(expected)),
        }
    }
}

/// A single-field predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub field: String,
    pub op: Comparison,
    pub value: FilterValue,
}

impl Predicate {
    /// Entries lacking the field, or holding a value of another type, never match.
    pub fn matches(&self, raw: &RawEntry) -> bool {
        raw.get(&self.field)
            .and_then(|stored| self.value.compare(stored))
            .is_some_and(|ordering| self.op.accepts(ordering))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// An immutable filter and sort over one collection.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use portail_core::QueryDescriptor;
///
/// let now = Utc::now();
/// assert_eq!(QueryDescriptor::upcoming(now), QueryDescriptor::upcoming(now));
/// assert_ne!(QueryDescriptor::upcoming(now), QueryDescriptor::past(now));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
    collection: Collection,
    predicate: Option<Predicate>,
    order_by: Option<OrderBy>,
}

impl QueryDescriptor {
    /// Every document of a collection, in document id order.
    pub fn all(collection: Collection) -> Self {
        Self {
            collection,
            predicate: None,
            order_by: None,
        }
    }

    /// Events starting strictly after `now`, earliest first.
    pub fn upcoming(now: DateTime<Utc>) -> Self {
        Self::all(Collection::events())
            .filter(fields::START_DATE, Comparison::GreaterThan, FilterValue::Timestamp(now))
            .order_by(fields::START_DATE, Direction::Ascending)
    }

    /// Events that started strictly before `now`, earliest first.
    pub fn past(now: DateTime<Utc>) -> Self {
        Self::all(Collection::events())
            .filter(fields::START_DATE, Comparison::LessThan, FilterValue::Timestamp(now))
            .order_by(fields::START_DATE, Direction::Ascending)
    }

    /// A copy of this descriptor restricted by `field op value`.
    pub fn filter(mut self, field: impl Into<String>, op: Comparison, value: FilterValue) -> Self {
        self.predicate = Some(Predicate {
            field: field.into(),
            op,
            value,
        });
        self
    }

    /// A copy of this descriptor ordered by `field`.
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn ordering(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    /// Whether a raw entry passes the predicate.
    pub fn matches(&self, raw: &RawEntry) -> bool {
        self.predicate.as_ref().is_none_or(|p| p.matches(raw))
    }

    /// Order two raw entries by the ordering field.
    ///
    /// Entries without the field sort first; ties are left to the caller.
    pub fn compare(&self, a: &RawEntry, b: &RawEntry) -> Ordering {
        let Some(order) = &self.order_by else {
            return Ordering::Equal;
        };

        let ordering = SortKey::of(a.get(&order.field)).cmp_key(&SortKey::of(b.get(&order.field)));
        match order.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }

    /// Build the result set of this query from a collection's documents.
    ///
    /// Documents of other collections are ignored. Ties in the ordering
    /// field are broken by document reference so results are deterministic.
    pub fn evaluate<I>(&self, documents: I) -> Vec<SnapshotEntry>
    where
        I: IntoIterator<Item = (DocumentRef, RawEntry)>,
    {
        let mut entries: Vec<SnapshotEntry> = documents
            .into_iter()
            .filter(|(origin, raw)| origin.collection() == &self.collection && self.matches(raw))
            .map(|(origin, raw)| SnapshotEntry { origin, raw })
            .collect();

        entries.sort_by(|a, b| {
            self.compare(&a.raw, &b.raw)
                .then_with(|| a.origin.cmp(&b.origin))
        });

        entries
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        if let Some(p) = &self.predicate {
            let op = match p.op {
                Comparison::LessThan => "<",
                Comparison::LessThanOrEqual => "<=",
                Comparison::Equal => "==",
                Comparison::GreaterThanOrEqual => ">=",
                Comparison::GreaterThan => ">",
            };
            let value = match &p.value {
                FilterValue::Timestamp(ts) => ts.to_rfc3339(),
                FilterValue::Text(text) => format!("{:?}", text),
                FilterValue::Integer(n) => n.to_string(),
            };
            write!(f, " where {} {} {}", p.field, op, value)?;
        }
        if let Some(order) = &self.order_by {
            let direction = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            write!(f, " order by {} {}", order.field, direction)?;
        }
        Ok(())
    }
}

enum SortKey<'a> {
    Missing,
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(&'a str),
    Other,
}

impl<'a> SortKey<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Missing,
            Some(Value::Number(n)) => n.as_f64().map_or(SortKey::Other, SortKey::Number),
            Some(v @ Value::String(s)) => match fields::parse_timestamp(v) {
                Some(ts) => SortKey::Timestamp(ts),
                None => SortKey::Text(s),
            },
            Some(_) => SortKey::Other,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Number(_) => 1,
            SortKey::Timestamp(_) => 2,
            SortKey::Text(_) => 3,
            SortKey::Other => 4,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// The event filters offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventFilter {
    #[default]
    Upcoming,
    Past,
}

impl EventFilter {
    /// The descriptor for this filter, relative to `now`.
    pub fn descriptor(&self, now: DateTime<Utc>) -> QueryDescriptor {
        match self {
            EventFilter::Upcoming => QueryDescriptor::upcoming(now),
            EventFilter::Past => QueryDescriptor::past(now),
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventFilter::Upcoming => f.write_str("upcoming"),
            EventFilter::Past => f.write_str("past"),
        }
    }
}

impl FromStr for EventFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventFilter::Upcoming),
            "past" => Ok(EventFilter::Past),
            other => Err(InvalidInputError::Other {
                message: format!("unknown event filter '{}', expected 'upcoming' or 'past'", other),
            }
            .into()),
        }
    }
}
