//! Schema mapping store
//!
//! Declares, per namespace, which flattened fields are replicated, what they
//! are called on the target side, and which field is the primary key.
//!
//! # Format
//!
//! ```yaml
//! shop:                     # database
//!   orders:                 # collection
//!     pk: id                # reserved: primary key column
//!     _id:
//!       dest: id
//!       type: TEXT
//!     customer.name:
//!       dest: customer_name
//!     tags:
//!       type: _arrayOfScalars
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{Error, Result};
use crate::namespace::Namespace;

/// Reserved key holding a collection's primary key
pub const PRIMARY_KEY_ENTRY: &str = "pk";

/// `type` value marking a field as an array of scalars
pub const ARRAY_OF_SCALARS_TYPE: &str = "_arrayOfScalars";

/// What kind of value a mapped field carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldKind {
    /// No `type` declared
    #[default]
    Plain,
    /// List of primitive values (`_arrayOfScalars`)
    ScalarArray,
    /// Target column type passed through to writers (e.g. `TEXT`)
    Column(String),
}

impl FieldKind {
    /// True when no type was declared
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain)
    }
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => Self::Plain,
            ARRAY_OF_SCALARS_TYPE => Self::ScalarArray,
            _ => Self::Column(value),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Plain => String::new(),
            FieldKind::ScalarArray => ARRAY_OF_SCALARS_TYPE.to_string(),
            FieldKind::Column(column) => column,
        }
    }
}

impl Serialize for FieldKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Plain => serializer.serialize_none(),
            Self::ScalarArray => serializer.serialize_str(ARRAY_OF_SCALARS_TYPE),
            Self::Column(column) => serializer.serialize_str(column),
        }
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map(Self::from).unwrap_or_default())
    }
}

/// Mapping entry for one flattened field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Destination key name, when the field is renamed on output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,

    /// Declared `type`
    #[serde(rename = "type", default, skip_serializing_if = "FieldKind::is_plain")]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// A field kept under its own dotted path
    pub fn plain() -> Self {
        Self::default()
    }

    /// A field renamed to `dest`
    pub fn renamed(dest: impl Into<String>) -> Self {
        Self {
            dest: Some(dest.into()),
            kind: FieldKind::Plain,
        }
    }

    /// An array-of-scalars field
    pub fn scalar_array() -> Self {
        Self {
            dest: None,
            kind: FieldKind::ScalarArray,
        }
    }

    /// Set the destination name
    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Set the declared kind
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// True when the field is an array of scalars
    pub fn is_scalar_array(&self) -> bool {
        self.kind == FieldKind::ScalarArray
    }
}

/// Raw entry of a collection mapping as it appears in configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MappingEntry {
    /// Value of the reserved `pk` key
    PrimaryKey(String),
    /// Any other key
    Field(FieldDescriptor),
}

/// Mapping for a single collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, MappingEntry>",
    into = "BTreeMap<String, MappingEntry>"
)]
pub struct CollectionSchema {
    /// Primary key column on the target side
    pub primary_key: Option<String>,

    /// Declared fields keyed by dotted source path
    pub fields: BTreeMap<String, FieldDescriptor>,
}

impl TryFrom<BTreeMap<String, MappingEntry>> for CollectionSchema {
    type Error = String;

    fn try_from(entries: BTreeMap<String, MappingEntry>) -> std::result::Result<Self, String> {
        let mut schema = CollectionSchema::default();
        for (name, entry) in entries {
            match (name.as_str(), entry) {
                (PRIMARY_KEY_ENTRY, MappingEntry::PrimaryKey(pk)) => schema.primary_key = Some(pk),
                (PRIMARY_KEY_ENTRY, MappingEntry::Field(_)) => {
                    return Err(format!("'{PRIMARY_KEY_ENTRY}' must be a column name"));
                }
                (_, MappingEntry::Field(descriptor)) => {
                    schema.fields.insert(name, descriptor);
                }
                (_, MappingEntry::PrimaryKey(_)) => {
                    return Err(format!("field '{name}' must be a mapping, not a string"));
                }
            }
        }
        Ok(schema)
    }
}

impl From<CollectionSchema> for BTreeMap<String, MappingEntry> {
    fn from(schema: CollectionSchema) -> Self {
        let mut entries: BTreeMap<String, MappingEntry> = schema
            .fields
            .into_iter()
            .map(|(name, descriptor)| (name, MappingEntry::Field(descriptor)))
            .collect();
        if let Some(pk) = schema.primary_key {
            entries.insert(PRIMARY_KEY_ENTRY.to_string(), MappingEntry::PrimaryKey(pk));
        }
        entries
    }
}

impl CollectionSchema {
    /// Create an empty collection schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary key
    pub fn with_primary_key(mut self, pk: impl Into<String>) -> Self {
        self.primary_key = Some(pk.into());
        self
    }

    /// Declare a field
    pub fn with_field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), descriptor);
        self
    }

    /// Primary key, if declared
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Descriptor for a declared field
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Output key for a declared field: its `dest`, or the path itself
    pub fn destination<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.fields
            .get(name)
            .map(|descriptor| descriptor.dest.as_deref().unwrap_or(name))
    }

    /// Fields whose `dest` is `target`
    pub fn fields_mapped_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |(_, descriptor)| descriptor.dest.as_deref() == Some(target))
            .map(|(name, _)| name.as_str())
    }

    /// Fields declared as arrays of scalars
    pub fn scalar_array_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, descriptor)| descriptor.is_scalar_array())
            .map(|(name, _)| name.as_str())
    }
}

/// In-memory schema mappings for every replicated namespace.
///
/// Built once from configuration and shared read-only (typically behind an
/// `Arc`) for the lifetime of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, BTreeMap<String, CollectionSchema>>",
    into = "BTreeMap<String, BTreeMap<String, CollectionSchema>>"
)]
pub struct SchemaStore {
    collections: HashMap<Namespace, CollectionSchema>,
}

impl TryFrom<BTreeMap<String, BTreeMap<String, CollectionSchema>>> for SchemaStore {
    type Error = Error;

    fn try_from(databases: BTreeMap<String, BTreeMap<String, CollectionSchema>>) -> Result<Self> {
        let mut store = SchemaStore::new();
        for (database, collections) in databases {
            if database.contains(crate::namespace::SEPARATOR) {
                return Err(Error::InvalidMapping {
                    namespace: database,
                    message: "database names cannot contain '.'".to_string(),
                });
            }
            for (collection, schema) in collections {
                store.insert(Namespace::new(database.clone(), collection), schema);
            }
        }
        Ok(store)
    }
}

impl From<SchemaStore> for BTreeMap<String, BTreeMap<String, CollectionSchema>> {
    fn from(store: SchemaStore) -> Self {
        let mut databases: Self = BTreeMap::new();
        for (namespace, schema) in store.collections {
            databases
                .entry(namespace.database)
                .or_default()
                .insert(namespace.collection, schema);
        }
        databases
    }
}

impl SchemaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the schema of a namespace
    pub fn insert(&mut self, namespace: Namespace, schema: CollectionSchema) {
        self.collections.insert(namespace, schema);
    }

    /// Builder form of [`SchemaStore::insert`]
    pub fn with_collection(mut self, namespace: &str, schema: CollectionSchema) -> Result<Self> {
        self.insert(Namespace::parse(namespace)?, schema);
        Ok(self)
    }

    /// Number of mapped namespaces
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// True when nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Mapped namespaces in sorted order
    pub fn namespaces(&self) -> Vec<&Namespace> {
        let mut namespaces: Vec<_> = self.collections.keys().collect();
        namespaces.sort();
        namespaces
    }

    /// Schema of a resolved namespace, `None` when it is not mapped
    pub fn collection(&self, namespace: &Namespace) -> Option<&CollectionSchema> {
        self.collections.get(namespace)
    }

    /// Schema by separate database and collection names
    pub fn lookup(&self, database: &str, collection: &str) -> Option<&CollectionSchema> {
        self.collection(&Namespace::new(database, collection))
    }

    fn require(&self, namespace: &str) -> Result<&CollectionSchema> {
        let resolved = Namespace::parse(namespace)?;
        self.collection(&resolved).ok_or_else(|| Error::MissingSchema {
            namespace: namespace.to_string(),
        })
    }

    /// Primary key declared for `namespace`
    pub fn primary_key(&self, namespace: &str) -> Result<&str> {
        self.require(namespace)?
            .primary_key()
            .ok_or_else(|| Error::MissingPrimaryKey {
                namespace: namespace.to_string(),
            })
    }

    /// Whether `namespace` (and, if given, `field` within it) is mapped.
    ///
    /// Never fails: a malformed or unknown namespace is simply not mapped.
    pub fn is_mapped(&self, namespace: &str, field: Option<&str>) -> bool {
        let Ok(resolved) = Namespace::parse(namespace) else {
            return false;
        };
        match (self.collection(&resolved), field) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(schema), Some(field)) => schema.field(field).is_some(),
        }
    }

    /// True when no source field populates the primary key, so the target
    /// has to generate it.
    pub fn is_id_autogenerated(&self, namespace: &str) -> Result<bool> {
        let pk = self.primary_key(namespace)?;
        let schema = self.require(namespace)?;
        let populated_by = schema.fields_mapped_to(pk).count();
        if populated_by > 1 {
            tracing::warn!(namespace, pk, populated_by, "several fields map to the primary key");
        }
        Ok(populated_by == 0)
    }

    /// Fields declared as arrays of scalars; empty when not mapped
    pub fn scalar_array_fields(&self, database: &str, collection: &str) -> Vec<&str> {
        self.lookup(database, collection)
            .map(|schema| schema.scalar_array_fields().collect())
            .unwrap_or_default()
    }

    /// Output key of a declared field
    pub fn mapped_field<'a>(&'a self, namespace: &str, field: &'a str) -> Result<&'a str> {
        let missing = || Error::MissingField {
            namespace: namespace.to_string(),
            field: field.to_string(),
        };
        let resolved = Namespace::parse(namespace)?;
        self.collection(&resolved)
            .and_then(|schema| schema.destination(field))
            .ok_or_else(missing)
    }

    /// Report configuration smells that do not prevent mapping
    pub fn validate(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        for namespace in self.namespaces() {
            let Some(schema) = self.collection(namespace) else {
                continue;
            };

            if schema.primary_key().is_none() {
                issues.push(SchemaIssue::MissingPrimaryKey {
                    namespace: namespace.clone(),
                });
            }

            let mut by_dest: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for (name, descriptor) in &schema.fields {
                match descriptor.dest.as_deref() {
                    Some("") => issues.push(SchemaIssue::EmptyDestination {
                        namespace: namespace.clone(),
                        field: name.clone(),
                    }),
                    Some(dest) => by_dest.entry(dest).or_default().push(name.clone()),
                    None => by_dest.entry(name.as_str()).or_default().push(name.clone()),
                }
            }
            for (dest, fields) in by_dest {
                if fields.len() > 1 {
                    issues.push(SchemaIssue::DuplicateDestination {
                        namespace: namespace.clone(),
                        dest: dest.to_string(),
                        fields,
                    });
                }
            }
        }
        issues
    }
}

/// A configuration problem found by [`SchemaStore::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// Collection declares no `pk`
    MissingPrimaryKey {
        /// Affected namespace
        namespace: Namespace,
    },
    /// Field has `dest: ""`
    EmptyDestination {
        /// Affected namespace
        namespace: Namespace,
        /// Field with the empty destination
        field: String,
    },
    /// Several fields write the same output key; the last one wins
    DuplicateDestination {
        /// Affected namespace
        namespace: Namespace,
        /// Shared output key
        dest: String,
        /// Fields that map to it, sorted
        fields: Vec<String>,
    },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrimaryKey { namespace } => {
                write!(f, "{namespace}: no primary key declared")
            }
            Self::EmptyDestination { namespace, field } => {
                write!(f, "{namespace}: field '{field}' has an empty dest")
            }
            Self::DuplicateDestination {
                namespace,
                dest,
                fields,
            } => write!(
                f,
                "{namespace}: fields {} all map to '{dest}'",
                fields.join(", ")
            ),
        }
    }
}
