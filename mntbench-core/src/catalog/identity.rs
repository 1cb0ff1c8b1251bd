//! Structured benchmark identity
//!
//! A [`BenchmarkIdentity`] describes one corpus file: which benchmark
//! function it realizes and, for gate-level layouts, the configuration that
//! produced it. The [`Level`] decides which of the optional fields are set.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::benchmarks::find_benchmark;
use crate::error::{BenchError, Result};

/// Gate library a layout is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GateLibrary {
    #[serde(rename = "ONE")]
    One,
    #[serde(rename = "Bestagon")]
    Bestagon,
}

/// Clocking scheme used for physical design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ClockingScheme {
    #[serde(rename = "2DDWave")]
    TwoDDWave,
    #[serde(rename = "USE")]
    Use,
    #[serde(rename = "RES")]
    Res,
    #[serde(rename = "ESR")]
    Esr,
    #[serde(rename = "ROW")]
    Row,
}

/// Whether post-layout optimization was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Optimization {
    #[serde(rename = "Opt")]
    Optimized,
    #[serde(rename = "UnOpt")]
    Unoptimized,
    #[serde(rename = "n/a")]
    NotApplicable,
}

/// Whether input ordering was applied before placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum InputOrdering {
    #[serde(rename = "Ord")]
    Ordered,
    #[serde(rename = "UnOrd")]
    Unordered,
    #[serde(rename = "n/a")]
    NotApplicable,
}

/// Granularity of a corpus file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Level {
    /// One layout per physical design configuration
    #[serde(rename = "gate")]
    Gate,
    /// Best known layout for a benchmark and gate library
    #[serde(rename = "best")]
    BestGate,
    /// Logic network description (Verilog)
    #[serde(rename = "network")]
    Network,
}

/// Free-form single-token tag (algorithm or cost objective)
///
/// Always lowercase and never contains the filename delimiters, so it
/// survives an encode/decode cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(BenchError::InvalidIdentity {
                reason: "tag must not be empty".to_string(),
            });
        }
        if let Some(c) = value
            .chars()
            .find(|c| matches!(c, '_' | '.' | '/' | '\\') || c.is_whitespace())
        {
            return Err(BenchError::InvalidIdentity {
                reason: format!("tag '{value}' contains forbidden character {c:?}"),
            });
        }
        Ok(Tag(value.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical filename tokens for the closed enums
macro_rules! token_enum {
    ($ty:ident { $($variant:ident => $token:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            /// Spelling used in corpus file names
            pub fn token(&self) -> &'static str {
                match self {
                    $($ty::$variant => $token,)+
                }
            }

            /// Match a filename token, ignoring case
            pub fn from_token(token: &str) -> Option<Self> {
                $(
                    if token.eq_ignore_ascii_case($token) $(|| token.eq_ignore_ascii_case($alias))* {
                        return Some($ty::$variant);
                    }
                )+
                None
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::from_token(s.trim()).ok_or_else(|| {
                    let expected: Vec<&str> = vec![$($token),+];
                    format!("expected one of {}", expected.join(", "))
                })
            }
        }
    };
}

token_enum!(GateLibrary {
    One => "ONE" | "qca_one" | "qcaone",
    Bestagon => "Bestagon",
});

token_enum!(ClockingScheme {
    TwoDDWave => "2DDWave" | "twoddwave",
    Use => "USE",
    Res => "RES",
    Esr => "ESR",
    Row => "ROW",
});

token_enum!(Optimization {
    Optimized => "Opt" | "optimized",
    Unoptimized => "UnOpt" | "unoptimized",
    NotApplicable => "n/a",
});

token_enum!(InputOrdering {
    Ordered => "Ord" | "ordered",
    Unordered => "UnOrd" | "unordered",
    NotApplicable => "n/a",
});

token_enum!(Level {
    Gate => "gate" | "gatelevel" | "gate-level",
    BestGate => "best" | "bestgatelevel" | "best-gate-level",
    Network => "network" | "networklevel" | "network-level",
});

impl GateLibrary {
    pub const ALL: [GateLibrary; 2] = [GateLibrary::One, GateLibrary::Bestagon];
}

impl ClockingScheme {
    pub const ALL: [ClockingScheme; 5] = [
        ClockingScheme::TwoDDWave,
        ClockingScheme::Use,
        ClockingScheme::Res,
        ClockingScheme::Esr,
        ClockingScheme::Row,
    ];
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Gate, Level::BestGate, Level::Network];

    /// File extension used for this level
    pub fn extension(&self) -> &'static str {
        match self {
            Level::Gate | Level::BestGate => "fgl",
            Level::Network => "v",
        }
    }
}

/// Identity of one benchmark file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BenchmarkIdentity {
    pub benchmark_name: String,
    pub gate_library: Option<GateLibrary>,
    pub clocking_scheme: Option<ClockingScheme>,
    pub algorithm: Option<Tag>,
    pub optimized: Optimization,
    pub input_ordered: InputOrdering,
    pub cost_objective: Option<Tag>,
    pub level: Level,
}

impl BenchmarkIdentity {
    /// Logic network description of a benchmark
    pub fn network(benchmark: &str) -> Result<Self> {
        Ok(Self {
            benchmark_name: canonical_benchmark(benchmark)?,
            gate_library: None,
            clocking_scheme: None,
            algorithm: None,
            optimized: Optimization::NotApplicable,
            input_ordered: InputOrdering::NotApplicable,
            cost_objective: None,
            level: Level::Network,
        })
    }

    /// Best known layout of a benchmark in a gate library
    pub fn best(benchmark: &str, library: GateLibrary) -> Result<Self> {
        Ok(Self {
            gate_library: Some(library),
            level: Level::BestGate,
            ..Self::network(benchmark)?
        })
    }

    /// Gate-level layout for one physical design configuration
    #[allow(clippy::too_many_arguments)]
    pub fn gate(
        benchmark: &str,
        library: GateLibrary,
        scheme: ClockingScheme,
        algorithm: &str,
        optimized: bool,
        ordered: bool,
        cost_objective: &str,
    ) -> Result<Self> {
        Ok(Self {
            benchmark_name: canonical_benchmark(benchmark)?,
            gate_library: Some(library),
            clocking_scheme: Some(scheme),
            algorithm: Some(Tag::new(algorithm)?),
            optimized: if optimized {
                Optimization::Optimized
            } else {
                Optimization::Unoptimized
            },
            input_ordered: if ordered {
                InputOrdering::Ordered
            } else {
                InputOrdering::Unordered
            },
            cost_objective: Some(Tag::new(cost_objective)?),
            level: Level::Gate,
        })
    }

    /// Check the level invariant and the benchmark name
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(BenchError::InvalidIdentity { reason });

        match find_benchmark(&self.benchmark_name) {
            Some(info) if info.file_name == self.benchmark_name => {}
            Some(info) => {
                return invalid(format!(
                    "benchmark name '{}' is not in canonical form '{}'",
                    self.benchmark_name, info.file_name
                ))
            }
            None => return invalid(format!("unknown benchmark '{}'", self.benchmark_name)),
        }

        let present = [
            ("gate_library", self.gate_library.is_some()),
            ("clocking_scheme", self.clocking_scheme.is_some()),
            ("algorithm", self.algorithm.is_some()),
            ("optimized", self.optimized != Optimization::NotApplicable),
            ("input_ordered", self.input_ordered != InputOrdering::NotApplicable),
            ("cost_objective", self.cost_objective.is_some()),
        ];

        for (field, is_present) in present {
            let required = match self.level {
                Level::Gate => true,
                Level::BestGate => field == "gate_library",
                Level::Network => false,
            };
            if required != is_present {
                return invalid(format!(
                    "{} identity must {} '{}'",
                    self.level,
                    if required { "set" } else { "not set" },
                    field
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for BenchmarkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match super::codec::encode(self) {
            Ok(name) => f.write_str(&name),
            Err(_) => write!(f, "{} ({}, invalid)", self.benchmark_name, self.level),
        }
    }
}

fn canonical_benchmark(name: &str) -> Result<String> {
    find_benchmark(name)
        .map(|info| info.file_name.to_string())
        .ok_or_else(|| BenchError::InvalidIdentity {
            reason: format!("unknown benchmark '{name}'"),
        })
}
