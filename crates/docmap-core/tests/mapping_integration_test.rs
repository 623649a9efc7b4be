//! Integration tests for loading mappings and mapping documents end to end
//!
//! Tests use temporary directories with real mapping files to verify:
//! - Loading JSON and YAML mapping files
//! - Mapping change-stream documents to flat records
//! - Schema introspection used by target writers
//! - Flatten/unflatten round trips

use docmap_core::{
    Error, FlatDocument, Mapper, MapperConfig, ScalarArrayMode, SchemaIssue, SchemaStore,
    flatten_value, map_document, unflatten,
};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

const MAPPINGS_JSON: &str = r#"
{
  "shop": {
    "orders": {
      "pk": "id",
      "_id": {"dest": "id", "type": "TEXT"},
      "customer.name": {"dest": "customer_name", "type": "TEXT"},
      "customer.address.city": {"dest": "city"},
      "total": {"type": "NUMERIC"},
      "lines.0.sku": {"dest": "first_sku"},
      "tags": {"type": "_arrayOfScalars"}
    },
    "audit.events": {
      "pk": "event_id",
      "kind": {}
    }
  },
  "crm": {
    "contacts": {
      "email": {}
    }
  }
}
"#;

/// Helper to write the shared mapping file into a temporary directory.
///
/// Returns the `TempDir` (cleaned up on drop) and the loaded store.
fn load_fixture(file_name: &str, contents: &str) -> (TempDir, SchemaStore) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(file_name);
    std::fs::write(&path, contents).unwrap();
    let store = SchemaStore::load(&path).unwrap();
    (dir, store)
}

fn order() -> Value {
    json!({
        "_id": "5f1d",
        "customer": {
            "name": "Alice",
            "address": {"city": "Lyon", "zip": "69001"}
        },
        "total": 42.5,
        "lines": [
            {"sku": "A1", "qty": 2},
            {"sku": "B7", "qty": 1}
        ],
        "tags": ["gift", "express"],
        "internal": {"trace": "x"}
    })
}

// =============================================================================
// Mapping Pipeline Tests
// =============================================================================

#[test]
fn test_map_order_from_json_file() {
    let (_dir, store) = load_fixture("mappings.json", MAPPINGS_JSON);

    let record = map_document(&store, &order(), "shop.orders").unwrap();
    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({
            "id": "5f1d",
            "customer_name": "Alice",
            "city": "Lyon",
            "total": 42.5,
            "first_sku": "A1"
        })
    );
}

#[test]
fn test_mapper_adds_joined_tags() {
    let (_dir, store) = load_fixture("mappings.json", MAPPINGS_JSON);
    let mapper = Mapper::new(Arc::new(store), MapperConfig::default());

    let record = mapper.map(&order(), "shop.orders").unwrap();
    assert_eq!(record["tags"].to_string(), "gift --*-- express");
    assert_eq!(record.len(), 6);
}

#[test]
fn test_mapper_adds_indexed_tags() {
    let (_dir, store) = load_fixture("mappings.json", MAPPINGS_JSON);
    let config = MapperConfig {
        scalar_arrays: ScalarArrayMode::Indexed,
    };
    let mapper = Mapper::new(Arc::new(store), config);

    let record = mapper.map(&order(), "shop.orders").unwrap();
    assert_eq!(record["tags.0"].to_string(), "gift");
    assert_eq!(record["tags.1"].to_string(), "express");
    assert!(!record.contains_key("tags"));
}

#[test]
fn test_collection_with_dotted_name() {
    let (_dir, store) = load_fixture("mappings.json", MAPPINGS_JSON);

    let record = map_document(
        &store,
        &json!({"kind": "login", "user": "bob"}),
        "shop.audit.events",
    )
    .unwrap();
    assert_eq!(serde_json::to_value(&record).unwrap(), json!({"kind": "login"}));
    assert_eq!(store.primary_key("shop.audit.events").unwrap(), "event_id");
}

#[rstest]
#[case("shop.customers")]
#[case("billing.orders")]
fn test_unmapped_namespaces_are_dropped(#[case] namespace: &str) {
    let (_dir, store) = load_fixture("mappings.json", MAPPINGS_JSON);
    let record = map_document(&store, &order(), namespace).unwrap();
    assert_eq!(record, FlatDocument::new());
    assert!(!store.is_mapped(namespace, None));
}

// =============================================================================
// Introspection Tests
// =============================================================================

#[test]
fn test_introspection_from_yaml_file() {
    let yaml = r#"
shop:
  orders:
    pk: id
    _id:
      dest: id
    tags:
      type: _arrayOfScalars
  carts:
    pk: cart_id
    items.0.sku:
      dest: sku
"#;
    let (_dir, store) = load_fixture("mappings.yaml", yaml);

    assert!(!store.is_id_autogenerated("shop.orders").unwrap());
    assert!(store.is_id_autogenerated("shop.carts").unwrap());
    assert_eq!(store.scalar_array_fields("shop", "orders"), vec!["tags"]);
    assert!(store.scalar_array_fields("shop", "carts").is_empty());
    assert_eq!(store.mapped_field("shop.carts", "items.0.sku").unwrap(), "sku");
}

#[test]
fn test_primary_key_errors() {
    let (_dir, store) = load_fixture("mappings.json", MAPPINGS_JSON);

    assert!(matches!(
        store.primary_key("crm.contacts"),
        Err(Error::MissingPrimaryKey { .. })
    ));
    assert!(matches!(
        store.is_id_autogenerated("crm.leads"),
        Err(Error::MissingSchema { .. })
    ));
    assert!(matches!(
        store.primary_key("crm"),
        Err(Error::MalformedNamespace { .. })
    ));
}

#[test]
fn test_validate_fixture() {
    let (_dir, store) = load_fixture("mappings.json", MAPPINGS_JSON);
    let issues = store.validate();
    assert_eq!(issues.len(), 1);
    assert!(matches!(&issues[0], SchemaIssue::MissingPrimaryKey { namespace }
        if namespace.to_string() == "crm.contacts"));
}

// =============================================================================
// Flattening Tests
// =============================================================================

#[rstest]
#[case(json!({"a": 2, "b": {"c": {"d": 5}}, "e": [6, 7, 8]}))]
#[case(order())]
#[case(json!({"deep": [[{"x": [true, null]}]], "s": "plain"}))]
fn test_flatten_round_trip(#[case] document: Value) {
    let flat = flatten_value(&document).unwrap();
    assert!(
        flat.keys().all(|k| !k.is_empty()),
        "flattened keys must be non-empty paths"
    );
    assert_eq!(unflatten(&flat), document);
}
