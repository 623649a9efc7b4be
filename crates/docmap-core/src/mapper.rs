//! Document mapping
//!
//! Flattens a raw document, keeps only the fields declared for its
//! namespace, and renames them to their destination keys.
//!
//! ```text
//! schema:   {"db": {"coll": {"a": {}, "b.c.d": {"dest": "bcd"}}}}
//! document: {"a": 2, "b": {"c": {"d": 5}}, "e": [6, 7, 8]}
//! output:   {"a": 2, "bcd": 5}
//! ```
//!
//! Documents of unmapped namespaces produce an empty record, and undeclared
//! fields are left out. Neither is an error.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::{MapperConfig, ScalarArrayMode};
use crate::error::{Error, Result};
use crate::flatten::{FlatDocument, PATH_SEPARATOR, Scalar, flatten_value, json_kind};
use crate::namespace::Namespace;
use crate::schema::{CollectionSchema, SchemaStore};

/// Delimiter used when an array of scalars is stored as one text value
pub const SCALAR_ARRAY_DELIMITER: &str = " --*-- ";

/// Join scalar values into a single string.
///
/// ```rust
/// use docmap_core::scalar_array_to_string;
///
/// assert_eq!(scalar_array_to_string(["x", "y", "z"]), "x --*-- y --*-- z");
/// ```
pub fn scalar_array_to_string<I>(values: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(SCALAR_ARRAY_DELIMITER)
}

/// Map a document to the flat record declared for `namespace`.
///
/// Array-of-scalars fields get no special treatment here: their indexed
/// keys are dropped unless declared one by one. Use [`Mapper`] to encode
/// them.
pub fn map_document(
    store: &SchemaStore,
    document: &Value,
    namespace: &str,
) -> Result<FlatDocument> {
    map_with(store, document, namespace, None)
}

fn map_with(
    store: &SchemaStore,
    document: &Value,
    namespace: &str,
    scalar_arrays: Option<ScalarArrayMode>,
) -> Result<FlatDocument> {
    let flat = flatten_value(document)?;
    let resolved = Namespace::parse(namespace)?;

    let Some(schema) = store.collection(&resolved) else {
        debug!(namespace, "namespace is not mapped, dropping document");
        return Ok(FlatDocument::new());
    };

    let mut output = rename_fields(schema, &resolved, filter_fields(schema, flat))?;
    if let Some(mode) = scalar_arrays {
        encode_scalar_arrays(schema, document, mode, &mut output);
    }
    Ok(output)
}

fn filter_fields(schema: &CollectionSchema, flat: FlatDocument) -> FlatDocument {
    flat.into_iter()
        .filter(|(path, _)| {
            let declared = schema.fields.contains_key(path);
            if !declared {
                trace!(path = %path, "field not declared, skipping");
            }
            declared
        })
        .collect()
}

fn rename_fields(
    schema: &CollectionSchema,
    namespace: &Namespace,
    filtered: FlatDocument,
) -> Result<FlatDocument> {
    let mut output = FlatDocument::new();
    for (path, value) in filtered {
        let descriptor = schema.field(&path).ok_or_else(|| Error::UnmappedField {
            namespace: namespace.to_string(),
            field: path.clone(),
        })?;
        let key = match &descriptor.dest {
            Some(dest) => dest.clone(),
            None => path,
        };
        output.insert(key, value);
    }
    Ok(output)
}

fn encode_scalar_arrays(
    schema: &CollectionSchema,
    document: &Value,
    mode: ScalarArrayMode,
    output: &mut FlatDocument,
) {
    for field in schema.scalar_array_fields() {
        let Some(value) = document.pointer(&to_pointer(field)) else {
            continue;
        };
        let Value::Array(items) = value else {
            // Already carried through as a plain mapped value
            warn!(field, kind = json_kind(value), "array-of-scalars field is not an array");
            continue;
        };

        let elements: Vec<(usize, Scalar)> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let scalar = Scalar::from_value(item);
                if scalar.is_none() {
                    warn!(field, index, "skipping nested value in array-of-scalars field");
                }
                scalar.map(|s| (index, s))
            })
            .collect();

        let key = schema.destination(field).unwrap_or(field);
        match mode {
            ScalarArrayMode::Joined => {
                let joined = scalar_array_to_string(elements.iter().map(|(_, s)| s));
                output.insert(key.to_string(), Scalar::String(joined));
            }
            ScalarArrayMode::Indexed => {
                for (index, scalar) in elements {
                    output.insert(format!("{key}{PATH_SEPARATOR}{index}"), scalar);
                }
            }
        }
    }
}

/// Dotted path to JSON pointer (RFC 6901)
fn to_pointer(path: &str) -> String {
    path.split(PATH_SEPARATOR)
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

/// Maps documents against a shared schema store.
///
/// Cheap to clone; clones share the same store. Safe to use from many
/// workers at once.
#[derive(Debug, Clone)]
pub struct Mapper {
    store: Arc<SchemaStore>,
    config: MapperConfig,
}

impl Mapper {
    /// Create a mapper over `store`
    pub fn new(store: Arc<SchemaStore>, config: MapperConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Mapper options
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Map a document, encoding array-of-scalars fields per the config
    pub fn map(&self, document: &Value, namespace: &str) -> Result<FlatDocument> {
        map_with(&self.store, document, namespace, Some(self.config.scalar_arrays))
    }

    /// See [`SchemaStore::primary_key`]
    pub fn primary_key(&self, namespace: &str) -> Result<&str> {
        self.store.primary_key(namespace)
    }

    /// See [`SchemaStore::is_mapped`]
    pub fn is_mapped(&self, namespace: &str, field: Option<&str>) -> bool {
        self.store.is_mapped(namespace, field)
    }

    /// See [`SchemaStore::is_id_autogenerated`]
    pub fn is_id_autogenerated(&self, namespace: &str) -> Result<bool> {
        self.store.is_id_autogenerated(namespace)
    }

    /// See [`SchemaStore::scalar_array_fields`]
    pub fn scalar_array_fields(&self, database: &str, collection: &str) -> Vec<&str> {
        self.store.scalar_array_fields(database, collection)
    }

    /// See [`SchemaStore::mapped_field`]
    pub fn mapped_field<'a>(&'a self, namespace: &str, field: &'a str) -> Result<&'a str> {
        self.store.mapped_field(namespace, field)
    }
}
