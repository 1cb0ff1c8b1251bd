//! Filter specifications and query evaluation
//!
//! A [`FilterSpec`] constrains zero or more attributes. Within one attribute
//! the chosen values are alternatives; across attributes the constraints are
//! intersected. An empty spec selects the whole catalog.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::attribute::{Attribute, AttributeValue};
use super::identity::{ClockingScheme, GateLibrary, Level};
use super::index::{CatalogEntry, CatalogIndex};
use crate::error::{BenchError, Result};

/// Raw values meaning "no constraint"
const ANY_VALUES: &[&str] = &["any", "*", ""];

/// Validated filter over the catalog attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    constraints: BTreeMap<Attribute, BTreeSet<AttributeValue>>,
}

impl FilterSpec {
    /// Filter that matches every entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from untyped `(attribute, value)` pairs
    ///
    /// Unknown attributes or values are rejected. The value `any` leaves the
    /// attribute unconstrained unless another pair constrains it.
    pub fn parse<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = Self::new();
        for (key, raw) in pairs {
            let attribute: Attribute = key.as_ref().parse()?;
            let raw = raw.as_ref().trim();
            if ANY_VALUES.iter().any(|any| raw.eq_ignore_ascii_case(any)) {
                continue;
            }
            for part in raw.split(',') {
                spec = spec.with(attribute.parse_value(part)?);
            }
        }
        Ok(spec)
    }

    /// Parse `attribute=value` expressions
    pub fn parse_expressions<S: AsRef<str>>(expressions: &[S]) -> Result<Self> {
        let pairs = expressions
            .iter()
            .map(|expr| {
                let expr = expr.as_ref();
                expr.split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .ok_or_else(|| {
                        BenchError::invalid_filter(expr, "", "expected attribute=value")
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::parse(pairs)
    }

    /// Add an accepted value
    pub fn with(mut self, value: AttributeValue) -> Self {
        self.constraints
            .entry(value.attribute())
            .or_default()
            .insert(value);
        self
    }

    pub fn benchmark(self, name: &str) -> Result<Self> {
        Ok(self.with(Attribute::BenchmarkName.parse_value(name)?))
    }

    pub fn gate_library(self, library: GateLibrary) -> Self {
        self.with(AttributeValue::GateLibrary(library))
    }

    pub fn clocking_scheme(self, scheme: ClockingScheme) -> Self {
        self.with(AttributeValue::ClockingScheme(scheme))
    }

    pub fn level(self, level: Level) -> Self {
        self.with(AttributeValue::Level(level))
    }

    /// Whether no attribute is constrained
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Accepted values for an attribute, if it is constrained
    pub fn accepted(&self, attribute: Attribute) -> Option<&BTreeSet<AttributeValue>> {
        self.constraints.get(&attribute)
    }

    /// Whether an entry satisfies every constraint
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        self.constraints
            .values()
            .all(|accepted| accepted.iter().any(|v| entry.identity.has_value(v)))
    }
}

/// Evaluate a filter against an index
///
/// Candidate sets are intersected smallest first. Results come back in index
/// order; no match is an empty result, not an error.
pub fn query<'a>(index: &'a CatalogIndex, spec: &FilterSpec) -> Vec<&'a CatalogEntry> {
    if spec.is_empty() {
        return index.all().iter().collect();
    }

    let mut candidates: Vec<BTreeSet<usize>> = spec
        .constraints
        .values()
        .map(|accepted| {
            accepted
                .iter()
                .flat_map(|value| index.positions(value).iter().copied())
                .collect()
        })
        .collect();
    candidates.sort_by_key(BTreeSet::len);

    let mut iter = candidates.into_iter();
    let Some(mut selected) = iter.next() else {
        return Vec::new();
    };
    for other in iter {
        if selected.is_empty() {
            break;
        }
        selected.retain(|position| other.contains(position));
    }

    selected
        .into_iter()
        .map(|position| index.entry_at(position))
        .collect()
}
