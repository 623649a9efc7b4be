//! Namespace resolution
//!
//! A namespace names a collection inside a source database as
//! `"<database>.<collection>"`. Only the first `.` separates the two parts,
//! so collection names such as `"events.2024.archive"` survive intact.

use std::fmt;

use crate::error::{Error, Result};

/// Separator between database and collection
pub const SEPARATOR: char = '.';

/// A resolved `(database, collection)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    /// Source database name
    pub database: String,
    /// Collection name (may itself contain `.`)
    pub collection: String,
}

impl Namespace {
    /// Build a namespace from already separated parts
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Split a combined namespace string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docmap_core::Namespace;
    ///
    /// let ns = Namespace::parse("shop.orders.archive").unwrap();
    /// assert_eq!(ns.database, "shop");
    /// assert_eq!(ns.collection, "orders.archive");
    /// ```
    pub fn parse(namespace: &str) -> Result<Self> {
        let (database, collection) =
            namespace
                .split_once(SEPARATOR)
                .ok_or_else(|| Error::MalformedNamespace {
                    namespace: namespace.to_string(),
                })?;
        Ok(Self::new(database, collection))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.database, SEPARATOR, self.collection)
    }
}

impl std::str::FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
