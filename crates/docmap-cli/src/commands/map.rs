//! Map documents command

use anyhow::{Context, Result};
use docmap_core::{Mapper, MapperConfig, ScalarArrayMode, SchemaStore};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::sync::Arc;

/// Run the map command
pub fn run(
    mappings_path: &str,
    namespace: &str,
    input: Option<&str>,
    scalar_arrays: ScalarArrayMode,
) -> Result<()> {
    let store = SchemaStore::load(mappings_path).context("Failed to load mappings")?;
    if !store.is_mapped(namespace, None) {
        tracing::warn!("Namespace {} is not mapped; every document will be empty", namespace);
    }

    let mapper = Mapper::new(Arc::new(store), MapperConfig { scalar_arrays });

    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    let mut out = BufWriter::new(std::io::stdout().lock());

    let mut mapped = 0usize;
    let mut skipped = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line_number = index + 1;

        let document: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Skipping line {}: invalid JSON: {}", line_number, e);
                skipped += 1;
                continue;
            }
        };

        match mapper.map(&document, namespace) {
            Ok(record) => {
                serde_json::to_writer(&mut out, &record)?;
                out.write_all(b"\n")?;
                mapped += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", line_number, e);
                skipped += 1;
            }
        }
    }
    out.flush()?;

    tracing::info!("Mapped {} documents, skipped {}", mapped, skipped);
    Ok(())
}
