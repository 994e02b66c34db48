// src/source/mod.rs
//! Source document loading: filename allow-list, directory discovery, and
//! extraction of the spell list from one JSON document.

use anyhow::{Context, Result};
use glob::glob;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::flatten::Record;

/// Only these source books are exported; other JSON files in the data
/// directory are ignored even when well formed.
pub static ALLOWED_FILES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "spells-phb.json",
        "spells-egw.json",
        "spells-ftd.json",
        "spells-ggr.json",
        "spells-idrotf.json",
        "spells-llk.json",
        "spells-sato.json",
        "spells-scc.json",
        "spells-tce.json",
        "spells-xge.json",
        "spells-bmt.json",
        "spells-aag.json",
    ])
});

#[derive(Deserialize)]
struct SpellDocument {
    #[serde(default)]
    spell: Vec<Value>,
}

/// Find the allow-listed spell documents under `dir`, recursively, in sorted
/// order so sheet order is stable across runs.
pub fn discover(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.json", dir.as_ref().display());
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in glob(&pattern).context("building spell file glob")? {
        let path = entry?;
        match path.file_name().and_then(|name| name.to_str()) {
            Some(name) if ALLOWED_FILES.contains(name) => paths.push(path),
            Some(name) => debug!(name, "skipping file outside allow-list"),
            None => {}
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load one document and return its spell records. A document without a
/// `spell` array yields an empty list; empty or non-object entries are
/// filtered out before they reach the transformer.
pub fn load_spells(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading spell document {}", path.display()))?;
    let document: SpellDocument = serde_json::from_str(&text)
        .with_context(|| format!("parsing spell document {}", path.display()))?;

    let spells = document
        .spell
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(spell) if !spell.is_empty() => Some(spell),
            _ => None,
        })
        .collect();
    Ok(spells)
}
