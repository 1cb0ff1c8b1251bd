//! MNT Bench Catalog - benchmark identity, indexing and queries
//!
//! This module provides functionality for decoding benchmark file names,
//! indexing a local corpus and selecting subsets of it by attribute.
//!
//! # Overview
//!
//! ```text
//! corpus/                          ← one extracted release
//!     mux21.v                      ← network level
//!     mux21_ONE_BEST.fgl           ← best gate level
//!     mux21_ONE_USE_exact_UnOpt_UnOrd_area.fgl
//!            │
//!            ▼  decode (codec)
//!     CatalogIndex                 ← entries + per-attribute postings
//!            │
//!            ▼  query (filter)
//!     Vec<&CatalogEntry>           ← handed to the archive builder
//! ```

mod attribute;
mod benchmarks;
mod codec;
mod dimensions;
mod filter;
mod identity;
mod index;

pub use attribute::{Attribute, AttributeValue};
pub use benchmarks::{
    benchmark_by_id, find_benchmark, suite_benchmarks, BenchmarkInfo, Suite, KNOWN_BENCHMARKS,
};
pub use codec::{decode, encode, BEST_MARKER, DELIMITER};
pub use dimensions::{load_dimensions, parse_dimensions, LayoutDimensions, DIMENSIONS_FILE};
pub use filter::{query, FilterSpec};
pub use identity::{
    BenchmarkIdentity, ClockingScheme, GateLibrary, InputOrdering, Level, Optimization, Tag,
};
pub use index::{CatalogEntry, CatalogIndex, SelectionSummary, SkippedEntry};
