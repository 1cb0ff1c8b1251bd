//! Selection archives
//!
//! Packages a set of catalog entries into one zip file. Entries are written
//! sorted by relative path with fixed timestamps and permissions, so the
//! same selection always yields the same bytes.

use std::io::{Cursor, Seek, Write};
use std::path::{Component, Path};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::catalog::CatalogEntry;
use crate::error::{BenchError, Result};

/// Deflate level used for selection archives
const COMPRESSION_LEVEL: i64 = 3;

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

/// Write the selected entries as a zip archive into `writer`
///
/// Returns the writer after the central directory has been written.
pub fn write_archive<'a, W, I>(corpus_root: &Path, entries: I, writer: W) -> Result<W>
where
    W: Write + Seek,
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let mut selected: Vec<&CatalogEntry> = entries.into_iter().collect();
    if selected.is_empty() {
        return Err(BenchError::EmptySelection);
    }
    selected.sort_by(|a, b| a.path.cmp(&b.path));
    selected.dedup_by(|a, b| a.path == b.path);

    let mut zip = ZipWriter::new(writer);

    for entry in selected {
        if !is_enclosed(&entry.path) {
            return Err(BenchError::UnknownEntry {
                path: entry.path.clone(),
            });
        }
        let source = corpus_root.join(&entry.path);
        let mut file = std::fs::File::open(&source).map_err(|e| BenchError::io(&source, e))?;

        zip.start_file(entry.path.as_str(), entry_options())
            .map_err(|e| archive_error(&entry.path, e))?;
        std::io::copy(&mut file, &mut zip).map_err(|e| BenchError::io(&source, e))?;
    }

    zip.finish().map_err(|e| archive_error("central directory", e))
}

/// Build the archive in memory
pub fn build_archive<'a, I>(corpus_root: &Path, entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let cursor = write_archive(corpus_root, entries, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Relative path that stays below the corpus root
fn is_enclosed(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn archive_error(what: &str, e: zip::result::ZipError) -> BenchError {
    BenchError::io(what, std::io::Error::other(e.to_string()))
}
