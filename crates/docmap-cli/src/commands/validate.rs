//! Validate mappings command

use anyhow::{Context, Result};
use docmap_core::SchemaStore;

/// Run the validate command
pub fn run(mappings_path: &str) -> Result<()> {
    tracing::info!("Validating mappings: {}", mappings_path);

    let store = SchemaStore::load(mappings_path).context("Failed to load mappings")?;

    for namespace in store.namespaces() {
        tracing::info!("✓ {}", namespace);
    }

    let issues = store.validate();
    for issue in &issues {
        tracing::warn!("{}", issue);
        println!("warning: {}", issue);
    }

    tracing::info!(
        "✓ {} namespaces, {} warnings",
        store.len(),
        issues.len()
    );
    Ok(())
}
