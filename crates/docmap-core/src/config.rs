//! Configuration loading
//!
//! Schema mappings are usually kept next to the connector's own settings,
//! either as JSON (`mappings.json`) or YAML (`mappings.yaml`). Both use the
//! nested `database -> collection -> field` layout described in
//! [`crate::schema`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::SchemaStore;

/// How array-of-scalars fields are written by [`crate::Mapper`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScalarArrayMode {
    /// One text value joined with [`crate::mapper::SCALAR_ARRAY_DELIMITER`]
    #[default]
    Joined,
    /// One key per element: `<dest>.<index>`
    Indexed,
}

/// Mapper options
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MapperConfig {
    /// Encoding for array-of-scalars fields
    #[serde(default)]
    pub scalar_arrays: ScalarArrayMode,
}

impl SchemaStore {
    /// Parse mappings from a JSON string
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Parse mappings from a YAML string
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load mappings from a file.
    ///
    /// `.json` files are read as JSON; anything else is read as YAML, which
    /// also accepts JSON input.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let store = SchemaStore::load("./mappings.json")?;
    /// println!("{} namespaces mapped", store.len());
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let store = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&contents)?
        } else {
            Self::from_yaml_str(&contents)?
        };

        tracing::debug!(
            path = %path.display(),
            namespaces = store.len(),
            "loaded schema mappings"
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scalar_array_mode() {
        assert_eq!(ScalarArrayMode::default(), ScalarArrayMode::Joined);
    }

    #[test]
    fn test_parse_mapper_config() {
        let config: MapperConfig = serde_yaml::from_str("scalar_arrays: indexed\n").unwrap();
        assert_eq!(config.scalar_arrays, ScalarArrayMode::Indexed);

        let config: MapperConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.scalar_arrays, ScalarArrayMode::Joined);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
shop:
  orders:
    pk: id
    _id:
      dest: id
    customer.name:
      dest: customer_name
"#;
        let store = SchemaStore::from_yaml_str(yaml).unwrap();
        assert_eq!(store.primary_key("shop.orders").unwrap(), "id");
        assert_eq!(
            store.mapped_field("shop.orders", "customer.name").unwrap(),
            "customer_name"
        );
    }

    #[test]
    fn test_from_json_str_rejects_bad_shape() {
        let result = SchemaStore::from_json_str(r#"{"db": {"coll": {"pk": {"dest": "x"}}}}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SchemaStore::load(dir.path().join("nope.json"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("mappings.json");
        std::fs::write(&json_path, r#"{"db": {"coll": {"pk": "id", "a": {}}}}"#).unwrap();
        let yaml_path = dir.path().join("mappings.yml");
        std::fs::write(&yaml_path, "db:\n  coll:\n    pk: id\n    a: {}\n").unwrap();

        let from_json = SchemaStore::load(&json_path).unwrap();
        let from_yaml = SchemaStore::load(&yaml_path).unwrap();
        assert_eq!(from_json, from_yaml);
        assert!(from_json.is_mapped("db.coll", Some("a")));
    }
}
