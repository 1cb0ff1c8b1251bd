//! Catalog index over a local corpus directory
//!
//! The index is built once per corpus version by scanning every regular
//! file below the corpus root. Entries are kept sorted by relative path and
//! each attribute value maps to the positions of the entries carrying it.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use walkdir::WalkDir;

use super::attribute::{Attribute, AttributeValue};
use super::codec;
use super::dimensions::{load_dimensions, LayoutDimensions, DIMENSIONS_FILE};
use super::identity::BenchmarkIdentity;
use crate::error::{BenchError, Result};

/// One benchmark file in the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub identity: BenchmarkIdentity,
    /// Path relative to the corpus root, `/`-separated
    pub path: String,
    /// File size in bytes
    pub size: u64,
    /// Layout metadata, if the corpus ships it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<LayoutDimensions>,
}

impl CatalogEntry {
    /// File name without directories
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Totals over a selection of entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub files: usize,
    /// Bytes on disk
    pub size_uncompressed: u64,
    /// Compressed bytes from the layout metadata, if every selected file has them
    pub size_compressed: Option<u64>,
}

impl SelectionSummary {
    pub fn of<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a CatalogEntry>,
    {
        let mut summary = Self::default();
        let mut compressed = Some(0u64);
        for entry in entries {
            summary.files += 1;
            summary.size_uncompressed = summary.size_uncompressed.saturating_add(entry.size);
            compressed = compressed
                .zip(entry.dimensions.and_then(|d| d.size_compressed))
                .and_then(|(total, size)| total.checked_add(size));
        }
        summary.size_compressed = compressed.filter(|_| summary.files > 0);
        summary
    }
}

/// A corpus file that is not a benchmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

impl From<SkippedEntry> for BenchError {
    fn from(skipped: SkippedEntry) -> Self {
        BenchError::SkippedEntry {
            path: skipped.path,
            reason: skipped.reason,
        }
    }
}

/// Immutable index of one corpus version
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    by_identity: HashMap<BenchmarkIdentity, usize>,
    postings: HashMap<AttributeValue, Vec<usize>>,
    skipped: Vec<SkippedEntry>,
}

impl CatalogIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a corpus directory and index every benchmark file in it
    ///
    /// Files whose names do not decode are skipped with a warning. Two files
    /// with the same identity abort the build.
    pub fn build(corpus_root: &Path) -> Result<Self> {
        let dimensions = match load_dimensions(corpus_root) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("Ignoring layout metadata: {}", e);
                Default::default()
            }
        };

        let mut files = Vec::new();
        for item in WalkDir::new(corpus_root).follow_links(false) {
            let item = item.map_err(|e| {
                let path = e.path().unwrap_or(corpus_root).to_path_buf();
                BenchError::io(path, e.into())
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            let relative = item
                .path()
                .strip_prefix(corpus_root)
                .unwrap_or(item.path())
                .to_path_buf();
            files.push((relative, item.path().to_path_buf()));
        }
        files.sort();

        let mut entries = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();

        for (relative, absolute) in files {
            let Some(path) = relative_path_string(&relative) else {
                skipped.push(SkippedEntry {
                    path: relative.display().to_string(),
                    reason: "path is not valid UTF-8".to_string(),
                });
                continue;
            };
            if path == DIMENSIONS_FILE {
                continue;
            }

            let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
            let identity = match codec::decode(&file_name) {
                Ok(identity) => identity,
                Err(e) => {
                    skipped.push(SkippedEntry {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let size = std::fs::metadata(&absolute)
                .map_err(|e| BenchError::io(&absolute, e))?
                .len();

            entries.push(CatalogEntry {
                dimensions: dimensions.get(&file_name).copied(),
                identity,
                path,
                size,
            });
        }

        for skip in &skipped {
            tracing::warn!("{}", BenchError::from(skip.clone()));
        }

        let mut index = Self::from_entries(entries)?;
        index.skipped = skipped;

        tracing::debug!(
            "Indexed {} benchmark files under {} ({} skipped)",
            index.len(),
            corpus_root.display(),
            index.skipped.len()
        );

        Ok(index)
    }

    /// Build an index from already decoded entries
    pub fn from_entries(mut entries: Vec<CatalogEntry>) -> Result<Self> {
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        let mut by_identity: HashMap<BenchmarkIdentity, usize> = HashMap::new();
        let mut postings: HashMap<AttributeValue, Vec<usize>> = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            if let Some(&first) = by_identity.get(&entry.identity) {
                return Err(BenchError::DuplicateIdentity {
                    identity: entry.identity.to_string(),
                    first: entries[first].path.clone(),
                    second: entry.path.clone(),
                });
            }
            by_identity.insert(entry.identity.clone(), position);

            for value in entry.identity.attribute_values() {
                postings.entry(value).or_default().push(position);
            }
        }

        Ok(Self {
            entries,
            by_identity,
            postings,
            skipped: Vec::new(),
        })
    }

    /// Entries carrying an attribute value, in index order
    pub fn lookup(&self, value: &AttributeValue) -> Vec<&CatalogEntry> {
        self.positions(value)
            .iter()
            .map(|&i| &self.entries[i])
            .collect()
    }

    /// Positions of the entries carrying an attribute value, ascending
    pub(crate) fn positions(&self, value: &AttributeValue) -> &[usize] {
        self.postings.get(value).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn entry_at(&self, position: usize) -> &CatalogEntry {
        &self.entries[position]
    }

    /// All entries, sorted by relative path
    pub fn all(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entry for an exact identity
    pub fn get(&self, identity: &BenchmarkIdentity) -> Option<&CatalogEntry> {
        self.by_identity.get(identity).map(|&i| &self.entries[i])
    }

    /// Distinct values of an attribute present in the index, ordered
    pub fn values(&self, attribute: Attribute) -> Vec<AttributeValue> {
        self.postings
            .keys()
            .filter(|v| v.attribute() == attribute)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Files that were left out of the index during the build
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Number of indexed benchmark files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all file sizes in bytes
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

fn relative_path_string(relative: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}
