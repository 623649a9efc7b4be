//! docmap Core Library
//!
//! Schema-driven document mapping for change-data-capture connectors that
//! replicate schemaless documents into column-oriented targets:
//! - Flattening nested documents into dotted-path records
//! - Namespace resolution (`database.collection`)
//! - Per-namespace schema mappings with field renaming
//! - Schema introspection for target writers (primary key, autogenerated
//!   ids, array-of-scalars fields)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Document   │────▶│   Flatten   │────▶│   Filter +  │────▶ flat record
//! │   (JSON)    │     │             │     │   Rename    │
//! └─────────────┘     └─────────────┘     └──────▲──────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │ SchemaStore │
//!                                         └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use docmap_core::{SchemaStore, map_document};
//! use serde_json::json;
//!
//! let store = SchemaStore::from_json_str(
//!     r#"{"db": {"coll": {"a": {}, "b.c.d": {"dest": "bcd"}}}}"#,
//! )?;
//! let document = json!({"a": 2, "b": {"c": {"d": 5}}, "e": [6, 7, 8]});
//!
//! let record = map_document(&store, &document, "db.coll")?;
//! assert_eq!(serde_json::to_value(&record)?, json!({"a": 2, "bcd": 5}));
//! # Ok::<(), docmap_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod flatten;
pub mod mapper;
pub mod namespace;
pub mod schema;

pub use config::{MapperConfig, ScalarArrayMode};
pub use error::{Error, Result};
pub use flatten::{FlatDocument, Scalar, flatten, flatten_value, unflatten};
pub use mapper::{Mapper, map_document, scalar_array_to_string};
pub use namespace::Namespace;
pub use schema::{CollectionSchema, FieldDescriptor, FieldKind, SchemaIssue, SchemaStore};
