//! Collection name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum length of a collection name.
const MAX_LEN: usize = 64;

/// A validated collection name, such as `events` or `news`.
///
/// Collection names are 1-64 characters of lowercase ASCII letters, digits,
/// `-` and `_`, and start with a letter.
///
/// # Example
///
/// ```
/// use portail_core::Collection;
///
/// let collection = Collection::new("events").unwrap();
/// assert_eq!(collection.as_str(), "events");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Collection(String);

impl Collection {
    /// Collection holding event records.
    pub const EVENTS: &'static str = "events";

    /// Collection holding news records.
    pub const NEWS: &'static str = "news";

    /// Create a new collection name, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid collection name.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// The `events` collection.
    pub fn events() -> Self {
        Self(Self::EVENTS.to_string())
    }

    /// The `news` collection.
    pub fn news() -> Self {
        Self(Self::NEWS.to_string())
    }

    /// Returns the collection name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::Collection {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if s.is_empty() {
            return Err(invalid("cannot be empty"));
        }

        if s.len() > MAX_LEN {
            return Err(invalid("exceeds maximum length of 64 characters"));
        }

        if !s.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(invalid("must start with a lowercase letter"));
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(invalid(&format!("contains invalid character '{}'", c)));
        }

        Ok(())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Collection {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Collection> for String {
    fn from(collection: Collection) -> Self {
        collection.0
    }
}

impl AsRef<str> for Collection {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
