//! Inspect namespace command

use anyhow::{Context, Result, bail};
use docmap_core::{FieldKind, Namespace, SchemaStore};

/// Run the inspect command
pub fn run(mappings_path: &str, namespace: &str) -> Result<()> {
    let store = SchemaStore::load(mappings_path).context("Failed to load mappings")?;
    let resolved = Namespace::parse(namespace)?;

    let Some(schema) = store.collection(&resolved) else {
        bail!("namespace '{}' is not mapped in {}", namespace, mappings_path);
    };

    println!("Namespace:      {}", resolved);
    match store.primary_key(namespace) {
        Ok(pk) => {
            println!("Primary key:    {}", pk);
            println!("Autogenerated:  {}", store.is_id_autogenerated(namespace)?);
        }
        Err(_) => println!("Primary key:    (none)"),
    }

    let scalar_arrays = store.scalar_array_fields(&resolved.database, &resolved.collection);
    if !scalar_arrays.is_empty() {
        println!("Scalar arrays:  {}", scalar_arrays.join(", "));
    }

    println!();
    println!("Fields:");
    for (name, descriptor) in &schema.fields {
        let dest = store.mapped_field(namespace, name)?;
        match &descriptor.kind {
            FieldKind::Plain => println!("  {} -> {}", name, dest),
            FieldKind::ScalarArray => println!("  {} -> {} [array of scalars]", name, dest),
            FieldKind::Column(column) => println!("  {} -> {} [{}]", name, dest, column),
        }
    }

    Ok(())
}
