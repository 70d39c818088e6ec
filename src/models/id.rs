//! Opaque record identifier.
//!
//! The native representation differs per storage backend: the relational
//! backend assigns auto-increment integers, the document backend assigns
//! ObjectId hex strings. Everything outside the backend mappers treats an
//! [`Id`] as an opaque comparable value; the mappers own the only
//! conversions to and from native form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned identifier in canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Wraps a relational integer key.
    #[must_use]
    pub fn from_int(value: i64) -> Self {
        Self(value.to_string())
    }

    /// Reads the identifier back as a relational integer key.
    ///
    /// Returns `None` when the canonical form is not numeric. An id that
    /// does not parse as the active backend's native representation cannot
    /// name an existing record, so callers treat `None` as "absent".
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
