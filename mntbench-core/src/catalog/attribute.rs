//! Filterable attributes of a benchmark identity

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::benchmarks::find_benchmark;
use super::identity::{
    BenchmarkIdentity, ClockingScheme, GateLibrary, InputOrdering, Level, Optimization, Tag,
};
use crate::error::{BenchError, Result};

/// Attribute names a filter can constrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    BenchmarkName,
    GateLibrary,
    ClockingScheme,
    Algorithm,
    Optimized,
    InputOrdered,
    CostObjective,
    Level,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::BenchmarkName,
        Attribute::GateLibrary,
        Attribute::ClockingScheme,
        Attribute::Algorithm,
        Attribute::Optimized,
        Attribute::InputOrdered,
        Attribute::CostObjective,
        Attribute::Level,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::BenchmarkName => "benchmark_name",
            Attribute::GateLibrary => "gate_library",
            Attribute::ClockingScheme => "clocking_scheme",
            Attribute::Algorithm => "algorithm",
            Attribute::Optimized => "optimized",
            Attribute::InputOrdered => "input_ordered",
            Attribute::CostObjective => "cost_objective",
            Attribute::Level => "level",
        }
    }

    /// Parse a raw value for this attribute
    pub fn parse_value(&self, raw: &str) -> Result<AttributeValue> {
        let raw = raw.trim();
        let invalid = |reason: String| BenchError::invalid_filter(self.name(), raw, reason);

        let value = match self {
            Attribute::BenchmarkName => find_benchmark(raw)
                .map(|info| AttributeValue::BenchmarkName(info.file_name.to_string()))
                .ok_or_else(|| invalid("unknown benchmark".to_string()))?,
            Attribute::GateLibrary => AttributeValue::GateLibrary(raw.parse().map_err(invalid)?),
            Attribute::ClockingScheme => {
                AttributeValue::ClockingScheme(raw.parse().map_err(invalid)?)
            }
            Attribute::Algorithm => AttributeValue::Algorithm(
                Tag::new(raw).map_err(|e| invalid(e.to_string()))?,
            ),
            Attribute::Optimized => match raw.parse().map_err(invalid)? {
                Optimization::NotApplicable => {
                    return Err(invalid("expected Opt or UnOpt".to_string()))
                }
                o => AttributeValue::Optimized(o),
            },
            Attribute::InputOrdered => match raw.parse().map_err(invalid)? {
                InputOrdering::NotApplicable => {
                    return Err(invalid("expected Ord or UnOrd".to_string()))
                }
                o => AttributeValue::InputOrdered(o),
            },
            Attribute::CostObjective => AttributeValue::CostObjective(
                Tag::new(raw).map_err(|e| invalid(e.to_string()))?,
            ),
            Attribute::Level => AttributeValue::Level(raw.parse().map_err(invalid)?),
        };

        Ok(value)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        let attribute = match key.as_str() {
            "benchmark_name" | "benchmark" | "name" => Attribute::BenchmarkName,
            "gate_library" | "library" => Attribute::GateLibrary,
            "clocking_scheme" | "scheme" | "clocking" => Attribute::ClockingScheme,
            "algorithm" | "physical_design_algorithm" => Attribute::Algorithm,
            "optimized" | "optimization" => Attribute::Optimized,
            "input_ordered" | "ordered" | "input_ordering" => Attribute::InputOrdered,
            "cost_objective" | "cost" => Attribute::CostObjective,
            "level" => Attribute::Level,
            _ => {
                return Err(BenchError::invalid_filter(
                    s,
                    "",
                    format!(
                        "unknown attribute (expected one of {})",
                        Attribute::ALL.map(|a| a.name()).join(", ")
                    ),
                ))
            }
        };
        Ok(attribute)
    }
}

/// A concrete value of one attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "attribute", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    BenchmarkName(String),
    GateLibrary(GateLibrary),
    ClockingScheme(ClockingScheme),
    Algorithm(Tag),
    Optimized(Optimization),
    InputOrdered(InputOrdering),
    CostObjective(Tag),
    Level(Level),
}

impl AttributeValue {
    pub fn attribute(&self) -> Attribute {
        match self {
            AttributeValue::BenchmarkName(_) => Attribute::BenchmarkName,
            AttributeValue::GateLibrary(_) => Attribute::GateLibrary,
            AttributeValue::ClockingScheme(_) => Attribute::ClockingScheme,
            AttributeValue::Algorithm(_) => Attribute::Algorithm,
            AttributeValue::Optimized(_) => Attribute::Optimized,
            AttributeValue::InputOrdered(_) => Attribute::InputOrdered,
            AttributeValue::CostObjective(_) => Attribute::CostObjective,
            AttributeValue::Level(_) => Attribute::Level,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::BenchmarkName(name) => f.write_str(name),
            AttributeValue::GateLibrary(v) => v.fmt(f),
            AttributeValue::ClockingScheme(v) => v.fmt(f),
            AttributeValue::Algorithm(v) | AttributeValue::CostObjective(v) => v.fmt(f),
            AttributeValue::Optimized(v) => v.fmt(f),
            AttributeValue::InputOrdered(v) => v.fmt(f),
            AttributeValue::Level(v) => v.fmt(f),
        }
    }
}

impl BenchmarkIdentity {
    /// Values of every attribute present on this identity
    pub fn attribute_values(&self) -> Vec<AttributeValue> {
        let mut values = vec![
            AttributeValue::BenchmarkName(self.benchmark_name.clone()),
            AttributeValue::Level(self.level),
        ];
        if let Some(library) = self.gate_library {
            values.push(AttributeValue::GateLibrary(library));
        }
        if let Some(scheme) = self.clocking_scheme {
            values.push(AttributeValue::ClockingScheme(scheme));
        }
        if let Some(algorithm) = &self.algorithm {
            values.push(AttributeValue::Algorithm(algorithm.clone()));
        }
        if self.optimized != Optimization::NotApplicable {
            values.push(AttributeValue::Optimized(self.optimized));
        }
        if self.input_ordered != InputOrdering::NotApplicable {
            values.push(AttributeValue::InputOrdered(self.input_ordered));
        }
        if let Some(cost) = &self.cost_objective {
            values.push(AttributeValue::CostObjective(cost.clone()));
        }
        values
    }

    /// Whether the identity carries exactly this value
    pub fn has_value(&self, value: &AttributeValue) -> bool {
        match value {
            AttributeValue::BenchmarkName(name) => &self.benchmark_name == name,
            AttributeValue::GateLibrary(v) => self.gate_library == Some(*v),
            AttributeValue::ClockingScheme(v) => self.clocking_scheme == Some(*v),
            AttributeValue::Algorithm(v) => self.algorithm.as_ref() == Some(v),
            AttributeValue::Optimized(v) => self.optimized == *v,
            AttributeValue::InputOrdered(v) => self.input_ordered == *v,
            AttributeValue::CostObjective(v) => self.cost_objective.as_ref() == Some(v),
            AttributeValue::Level(v) => self.level == *v,
        }
    }
}
