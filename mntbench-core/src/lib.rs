//! MNT Bench library exports

pub mod archive;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod sync;

pub use context::{BenchContext, CorpusStatus};
pub use error::{BenchError, Result};
