//! Known benchmark functions
//!
//! Every layout in the corpus is derived from one of a fixed set of logic
//! networks, grouped by the suite that published them. File names use the
//! lowercase `file_name` form.

use serde::Serialize;
use std::fmt;

/// Benchmark suite a function originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Suite {
    Trindade16,
    Fontes18,
    Iscas85,
    Epfl,
}

impl Suite {
    pub const ALL: [Suite; 4] = [Suite::Trindade16, Suite::Fontes18, Suite::Iscas85, Suite::Epfl];

    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Trindade16 => "Trindade16",
            Suite::Fontes18 => "Fontes18",
            Suite::Iscas85 => "ISCAS85",
            Suite::Epfl => "EPFL",
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A benchmark function known to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkInfo {
    /// Sequential id, stable across releases
    pub id: u32,
    pub suite: Suite,
    /// Human readable name
    pub display_name: &'static str,
    /// Name used inside corpus file names
    pub file_name: &'static str,
}

const fn bench(
    id: u32,
    suite: Suite,
    display_name: &'static str,
    file_name: &'static str,
) -> BenchmarkInfo {
    BenchmarkInfo {
        id,
        suite,
        display_name,
        file_name,
    }
}

/// All known benchmark functions in id order
pub const KNOWN_BENCHMARKS: &[BenchmarkInfo] = &[
    bench(1, Suite::Trindade16, "Multiplexer 2:1", "mux21"),
    bench(2, Suite::Trindade16, "XOR 2:1", "xor2"),
    bench(3, Suite::Trindade16, "XNOR 2:1", "xnor2"),
    bench(4, Suite::Trindade16, "Half Adder", "ha"),
    bench(5, Suite::Trindade16, "Full Adder", "fa"),
    bench(6, Suite::Trindade16, "Parity Generator", "par_gen"),
    bench(7, Suite::Trindade16, "Parity Check", "par_check"),
    bench(8, Suite::Fontes18, "t", "t"),
    bench(9, Suite::Fontes18, "t_5", "t_5"),
    bench(10, Suite::Fontes18, "b1_r2", "b1_r2"),
    bench(11, Suite::Fontes18, "majority", "majority"),
    bench(12, Suite::Fontes18, "majority_5_r1", "majority_5_r1"),
    bench(13, Suite::Fontes18, "newtag", "newtag"),
    bench(14, Suite::Fontes18, "clpl", "clpl"),
    bench(15, Suite::Fontes18, "1bitAdderAOIG", "1bitadderaoig"),
    bench(16, Suite::Fontes18, "1bitAdderMaj", "1bitaddermaj"),
    bench(17, Suite::Fontes18, "2bitAdderMaj", "2bitaddermaj"),
    bench(18, Suite::Fontes18, "XOR5Maj", "xor5maj"),
    bench(19, Suite::Fontes18, "xor5_r1", "xor5_r1"),
    bench(20, Suite::Fontes18, "cm82a_5", "cm82a_5"),
    bench(21, Suite::Fontes18, "parity", "parity"),
    bench(22, Suite::Iscas85, "c17", "c17"),
    bench(23, Suite::Iscas85, "c432", "c432"),
    bench(24, Suite::Iscas85, "c499", "c499"),
    bench(25, Suite::Iscas85, "c880", "c880"),
    bench(26, Suite::Iscas85, "c1355", "c1355"),
    bench(27, Suite::Iscas85, "c1908", "c1908"),
    bench(28, Suite::Iscas85, "c2670", "c2670"),
    bench(29, Suite::Iscas85, "c3540", "c3540"),
    bench(30, Suite::Iscas85, "c5315", "c5315"),
    bench(31, Suite::Iscas85, "c6288", "c6288"),
    bench(32, Suite::Iscas85, "c7552", "c7552"),
    bench(33, Suite::Epfl, "ctrl", "ctrl"),
    bench(34, Suite::Epfl, "router", "router"),
    bench(35, Suite::Epfl, "int2float", "int2float"),
    bench(36, Suite::Epfl, "cavlc", "cavlc"),
    bench(37, Suite::Epfl, "priority", "priority"),
    bench(38, Suite::Epfl, "dec", "dec"),
    bench(39, Suite::Epfl, "i2c", "i2c"),
    bench(40, Suite::Epfl, "adder", "adder"),
    bench(41, Suite::Epfl, "bar", "bar"),
    bench(42, Suite::Epfl, "max", "max"),
    bench(43, Suite::Epfl, "sin", "sin"),
    bench(44, Suite::Epfl, "arbiter", "arbiter"),
    bench(45, Suite::Epfl, "voter", "voter"),
    bench(46, Suite::Epfl, "square", "square"),
];

/// Look up a benchmark by its file name form (case-insensitive)
pub fn find_benchmark(name: &str) -> Option<&'static BenchmarkInfo> {
    KNOWN_BENCHMARKS
        .iter()
        .find(|b| b.file_name.eq_ignore_ascii_case(name))
}

/// Look up a benchmark by its sequential id
pub fn benchmark_by_id(id: u32) -> Option<&'static BenchmarkInfo> {
    KNOWN_BENCHMARKS.iter().find(|b| b.id == id)
}

/// All benchmarks of one suite, in id order
pub fn suite_benchmarks(suite: Suite) -> impl Iterator<Item = &'static BenchmarkInfo> {
    KNOWN_BENCHMARKS.iter().filter(move |b| b.suite == suite)
}
