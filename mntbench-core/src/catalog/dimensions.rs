//! Optional layout metadata (`layout_dimensions.json`)
//!
//! Releases may ship a JSON side file with the bounding box and file sizes
//! of every layout. It is a list of single-key objects:
//!
//! ```json
//! [{"mux21_ONE_BEST.fgl": {"x": 3, "y": 4, "size_uncompressed": 3513, "size_compressed": 517}}]
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{BenchError, Result};

/// File name of the metadata side file inside a corpus
pub const DIMENSIONS_FILE: &str = "layout_dimensions.json";

/// Layout bounding box and size information for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDimensions {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub x: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub y: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size_uncompressed: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size_compressed: Option<u64>,
}

impl LayoutDimensions {
    /// Layout area in tiles, if both extents are known
    pub fn area(&self) -> Option<u64> {
        self.x?.checked_mul(self.y?)
    }
}

/// Metadata keyed by file name
pub type DimensionTable = HashMap<String, LayoutDimensions>;

/// Load the metadata side file from a corpus root, if present
pub fn load_dimensions(corpus_root: &Path) -> Result<DimensionTable> {
    let path = corpus_root.join(DIMENSIONS_FILE);
    if !path.exists() {
        return Ok(DimensionTable::new());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| BenchError::io(&path, e))?;
    parse_dimensions(&content).map_err(|e| BenchError::Config {
        path,
        reason: e.to_string(),
    })
}

/// Parse the metadata side file contents
pub fn parse_dimensions(content: &str) -> serde_json::Result<DimensionTable> {
    let rows: Vec<HashMap<String, LayoutDimensions>> = serde_json::from_str(content)?;
    Ok(rows.into_iter().flatten().collect())
}

/// Accept numbers, numeric strings, empty strings and nulls
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid size {n}"))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid size '{s}'"))),
        other => Err(D::Error::custom(format!("invalid size {other}"))),
    }
}
