//! Benchmark file name grammar
//!
//! Three grammars, selected by extension, token count and the `BEST` marker:
//!
//! ```text
//! <name>.v                                                         network level
//! <name>_<library>_BEST.fgl                                        best gate level
//! <name>_<library>_<scheme>_<algorithm>_<opt>_<ord>_<cost>.fgl     gate level
//! ```
//!
//! Benchmark names may contain `_` themselves (`par_gen`, `majority_5_r1`),
//! so the configuration fields are anchored at the right end.

use super::benchmarks::find_benchmark;
use super::identity::{
    BenchmarkIdentity, ClockingScheme, GateLibrary, InputOrdering, Level, Optimization, Tag,
};
use crate::error::{BenchError, Result};

/// Field delimiter inside a file stem
pub const DELIMITER: char = '_';

/// Marker token for best-known layouts
pub const BEST_MARKER: &str = "BEST";

/// Number of configuration tokens following the name in a gate-level stem
const GATE_FIELDS: usize = 6;

/// Decode a file name (without directories) into a benchmark identity
pub fn decode(filename: &str) -> Result<BenchmarkIdentity> {
    let (stem, extension) = filename
        .rsplit_once('.')
        .ok_or_else(|| BenchError::malformed(filename, "missing file extension"))?;

    if stem.is_empty() {
        return Err(BenchError::malformed(filename, "empty file stem"));
    }

    match extension {
        "v" => decode_network(filename, stem),
        "fgl" => decode_layout(filename, stem),
        other => Err(BenchError::malformed(
            filename,
            format!("unsupported extension '.{other}' (expected .fgl or .v)"),
        )),
    }
}

/// Encode an identity into its canonical file name
pub fn encode(identity: &BenchmarkIdentity) -> Result<String> {
    identity.validate()?;

    let stem = match identity.level {
        Level::Network => identity.benchmark_name.clone(),
        Level::BestGate => format!(
            "{}_{}_{}",
            identity.benchmark_name,
            required(identity.gate_library.as_ref())?.token(),
            BEST_MARKER
        ),
        Level::Gate => [
            identity.benchmark_name.as_str(),
            required(identity.gate_library.as_ref())?.token(),
            required(identity.clocking_scheme.as_ref())?.token(),
            required(identity.algorithm.as_ref())?.as_str(),
            identity.optimized.token(),
            identity.input_ordered.token(),
            required(identity.cost_objective.as_ref())?.as_str(),
        ]
        .join("_"),
    };

    Ok(format!("{stem}.{}", identity.level.extension()))
}

fn required<T>(field: Option<&T>) -> Result<&T> {
    field.ok_or_else(|| BenchError::InvalidIdentity {
        reason: "missing field required by level".to_string(),
    })
}

fn decode_network(filename: &str, stem: &str) -> Result<BenchmarkIdentity> {
    let benchmark = known_benchmark(filename, stem)?;
    BenchmarkIdentity::network(benchmark)
}

fn decode_layout(filename: &str, stem: &str) -> Result<BenchmarkIdentity> {
    let tokens: Vec<&str> = stem.split(DELIMITER).collect();

    if tokens.iter().any(|t| t.is_empty()) {
        return Err(BenchError::malformed(filename, "empty field between delimiters"));
    }

    let last = tokens[tokens.len() - 1];
    if !last.eq_ignore_ascii_case(BEST_MARKER) {
        return decode_gate(filename, &tokens);
    }

    // a gate-level layout may use `best` as its cost objective
    match decode_best(filename, &tokens) {
        Ok(identity) => Ok(identity),
        Err(e) if tokens.len() > GATE_FIELDS => decode_gate(filename, &tokens).map_err(|_| e),
        Err(e) => Err(e),
    }
}

/// `<name...>_<library>_BEST`
fn decode_best(filename: &str, tokens: &[&str]) -> Result<BenchmarkIdentity> {
    if tokens.len() < 3 {
        return Err(BenchError::malformed(
            filename,
            format!("best-layout name needs at least 3 fields, found {}", tokens.len()),
        ));
    }
    let split = tokens.len() - 2;
    let name = tokens[..split].join("_");
    let benchmark = known_benchmark(filename, &name)?;
    let library = parse_library(filename, tokens[split])?;
    BenchmarkIdentity::best(benchmark, library)
}

/// `<name...>_<library>_<scheme>_<algorithm>_<opt>_<ord>_<cost>`
fn decode_gate(filename: &str, tokens: &[&str]) -> Result<BenchmarkIdentity> {
    if tokens.len() < GATE_FIELDS + 1 {
        return Err(BenchError::malformed(
            filename,
            format!(
                "gate-level name needs at least {} fields, found {}",
                GATE_FIELDS + 1,
                tokens.len()
            ),
        ));
    }

    let split = tokens.len() - GATE_FIELDS;
    let name = tokens[..split].join("_");
    let fields = &tokens[split..];

    let benchmark = known_benchmark(filename, &name)?;
    let library = parse_library(filename, fields[0])?;
    let scheme = ClockingScheme::from_token(fields[1]).ok_or_else(|| {
        BenchError::malformed(filename, format!("unknown clocking scheme '{}'", fields[1]))
    })?;
    let algorithm = tag(filename, "algorithm", fields[2])?;
    let optimized = match Optimization::from_token(fields[3]) {
        Some(o) if o != Optimization::NotApplicable => o,
        _ => {
            return Err(BenchError::malformed(
                filename,
                format!("expected Opt or UnOpt, found '{}'", fields[3]),
            ))
        }
    };
    let ordered = match InputOrdering::from_token(fields[4]) {
        Some(o) if o != InputOrdering::NotApplicable => o,
        _ => {
            return Err(BenchError::malformed(
                filename,
                format!("expected Ord or UnOrd, found '{}'", fields[4]),
            ))
        }
    };
    let cost = tag(filename, "cost objective", fields[5])?;

    Ok(BenchmarkIdentity {
        benchmark_name: benchmark.to_string(),
        gate_library: Some(library),
        clocking_scheme: Some(scheme),
        algorithm: Some(algorithm),
        optimized,
        input_ordered: ordered,
        cost_objective: Some(cost),
        level: Level::Gate,
    })
}

fn known_benchmark(filename: &str, name: &str) -> Result<&'static str> {
    match find_benchmark(name) {
        Some(info) => Ok(info.file_name),
        None => Err(BenchError::malformed(
            filename,
            format!("unknown benchmark '{name}'"),
        )),
    }
}

fn parse_library(filename: &str, token: &str) -> Result<GateLibrary> {
    GateLibrary::from_token(token).ok_or_else(|| {
        BenchError::malformed(filename, format!("unknown gate library '{token}'"))
    })
}

fn tag(filename: &str, what: &str, token: &str) -> Result<Tag> {
    Tag::new(token)
        .map_err(|_| BenchError::malformed(filename, format!("invalid {what} '{token}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_network() {
        let identity = decode("mux21.v").unwrap();
        assert_eq!(identity, BenchmarkIdentity::network("mux21").unwrap());
        assert_eq!(identity.gate_library, None);
        assert_eq!(identity.optimized, Optimization::NotApplicable);
    }

    #[test]
    fn test_decode_best() {
        let identity = decode("mux21_ONE_BEST.fgl").unwrap();
        assert_eq!(identity.level, Level::BestGate);
        assert_eq!(identity.gate_library, Some(GateLibrary::One));
        assert_eq!(identity.clocking_scheme, None);
    }

    #[test]
    fn test_decode_gate() {
        let identity = decode("parity_Bestagon_ROW_gold_UnOpt_UnOrd_wires.fgl").unwrap();
        assert_eq!(
            identity,
            BenchmarkIdentity::gate(
                "parity",
                GateLibrary::Bestagon,
                ClockingScheme::Row,
                "gold",
                false,
                false,
                "wires"
            )
            .unwrap()
        );
    }

    #[test]
    fn test_decode_name_with_underscores() {
        let identity = decode("majority_5_r1_ONE_2DDWave_exact_UnOpt_UnOrd_area.fgl").unwrap();
        assert_eq!(identity.benchmark_name, "majority_5_r1");
        assert_eq!(identity.clocking_scheme, Some(ClockingScheme::TwoDDWave));

        let identity = decode("par_gen_Bestagon_BEST.fgl").unwrap();
        assert_eq!(identity.benchmark_name, "par_gen");
    }

    #[test]
    fn test_decode_normalizes_case() {
        let identity = decode("MUX21_one_2ddwave_Exact_unopt_UNORD_Area.fgl").unwrap();
        assert_eq!(
            encode(&identity).unwrap(),
            "mux21_ONE_2DDWave_exact_UnOpt_UnOrd_area.fgl"
        );
    }

    #[test]
    fn test_decode_rejects_extra_token() {
        let err = decode("mux21_ONE_BEST_extra.fgl").unwrap_err();
        assert!(matches!(err, BenchError::MalformedIdentifier { .. }));
    }

    #[test]
    fn test_decode_rejects_bad_inputs() {
        for name in [
            "mux21",
            "mux21.txt",
            ".v",
            "unknown.v",
            "mux21_ONE_BEST.v",
            "mux21_QCA_BEST.fgl",
            "mux21_ONE_2DDWave.fgl",
            "mux21_ONE_DIAG_exact_UnOpt_UnOrd_area.fgl",
            "mux21_ONE_USE_exact_Maybe_UnOrd_area.fgl",
            "mux21_ONE_USE_exact_UnOpt_n/a_area.fgl",
            "mux21__ONE_USE_exact_UnOpt_UnOrd_area.fgl",
            "mux21_ONE_2DDWave_exact_UnOpt_UnOrd_area_extra.fgl",
            "mux21_ONE_USE_exact_UnOpt_BEST.fgl",
            "mux21_ONE_DIAG_exact_UnOpt_UnOrd_BEST.fgl",
        ] {
            assert!(
                matches!(decode(name), Err(BenchError::MalformedIdentifier { .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_best_cost_objective_is_gate_level() {
        let identity = BenchmarkIdentity::gate(
            "mux21",
            GateLibrary::One,
            ClockingScheme::Use,
            "exact",
            false,
            false,
            "best",
        )
        .unwrap();
        let name = encode(&identity).unwrap();
        assert_eq!(name, "mux21_ONE_USE_exact_UnOpt_UnOrd_best.fgl");
        assert_eq!(decode(&name).unwrap(), identity);

        let upper = decode("mux21_ONE_USE_exact_UnOpt_UnOrd_BEST.fgl").unwrap();
        assert_eq!(upper, identity);

        // still a best-level layout when the name resolves with two fields left
        let best = decode("majority_5_r1_Bestagon_BEST.fgl").unwrap();
        assert_eq!(best.level, Level::BestGate);
    }

    #[test]
    fn test_encode_rejects_invariant_violation() {
        let mut identity = BenchmarkIdentity::best("xor2", GateLibrary::Bestagon).unwrap();
        identity.gate_library = None;
        assert!(matches!(
            encode(&identity),
            Err(BenchError::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn test_round_trip_all_shapes() {
        let mut identities = Vec::new();
        for info in super::super::benchmarks::KNOWN_BENCHMARKS {
            identities.push(BenchmarkIdentity::network(info.file_name).unwrap());
            for library in GateLibrary::ALL {
                identities.push(BenchmarkIdentity::best(info.file_name, library).unwrap());
                for scheme in ClockingScheme::ALL {
                    for (opt, ord) in [(false, false), (true, false), (false, true), (true, true)] {
                        identities.push(
                            BenchmarkIdentity::gate(
                                info.file_name,
                                library,
                                scheme,
                                "ortho",
                                opt,
                                ord,
                                "crossings",
                            )
                            .unwrap(),
                        );
                        identities.push(
                            BenchmarkIdentity::gate(
                                info.file_name,
                                library,
                                scheme,
                                "exact",
                                opt,
                                ord,
                                "best",
                            )
                            .unwrap(),
                        );
                    }
                }
            }
        }

        for identity in identities {
            let name = encode(&identity).unwrap();
            assert_eq!(decode(&name).unwrap(), identity, "round trip of {name}");
        }
    }
}
