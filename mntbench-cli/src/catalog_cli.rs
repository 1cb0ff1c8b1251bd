//! Catalog commands: attribute values, queries and selection downloads

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use mntbench_core::catalog::{
    find_benchmark, Attribute, AttributeValue, CatalogEntry, FilterSpec, SelectionSummary,
};
use mntbench_core::BenchContext;

#[derive(Parser, Debug)]
pub struct ValuesArgs {
    /// Attribute name (e.g. gate_library, clocking_scheme, level)
    pub attribute: String,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Filter as attribute=value; comma-separate alternatives, repeat for more attributes
    #[clap(short, long = "filter", value_name = "ATTR=VALUE")]
    pub filters: Vec<String>,

    /// Output results as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Filter as attribute=value; comma-separate alternatives, repeat for more attributes
    #[clap(short, long = "filter", value_name = "ATTR=VALUE")]
    pub filters: Vec<String>,

    /// Output file (defaults to MNTBench_<timestamp>.zip)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

/// Table row for attribute values
#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Files")]
    files: usize,
    #[tabled(rename = "Description")]
    description: String,
}

/// Table row for query results
#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Benchmark")]
    benchmark: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Library")]
    library: String,
    #[tabled(rename = "Scheme")]
    scheme: String,
    #[tabled(rename = "Algorithm")]
    algorithm: String,
    #[tabled(rename = "Opt")]
    optimized: String,
    #[tabled(rename = "Ord")]
    ordered: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Path")]
    path: String,
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl From<&CatalogEntry> for EntryRow {
    fn from(entry: &CatalogEntry) -> Self {
        let identity = &entry.identity;
        let size = match entry.dimensions.and_then(|d| d.area()) {
            Some(area) => format!("{} B, {} tiles", entry.size, area),
            None => format!("{} B", entry.size),
        };
        EntryRow {
            benchmark: identity.benchmark_name.clone(),
            level: identity.level.to_string(),
            library: or_dash(identity.gate_library),
            scheme: or_dash(identity.clocking_scheme),
            algorithm: or_dash(identity.algorithm.as_ref()),
            optimized: identity.optimized.to_string(),
            ordered: identity.input_ordered.to_string(),
            cost: or_dash(identity.cost_objective.as_ref()),
            size,
            path: entry.path.clone(),
        }
    }
}

fn print_table<T: Tabled>(rows: &[T]) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");
}

pub fn execute_values(context: &BenchContext, args: ValuesArgs) -> Result<()> {
    let attribute: Attribute = args.attribute.parse()?;
    let values = context.list_attribute_values(attribute)?;
    let counts: Vec<usize> = values
        .iter()
        .map(|value| {
            context
                .run_query(&FilterSpec::new().with(value.clone()))
                .map(|entries| entries.len())
        })
        .collect::<mntbench_core::Result<_>>()?;

    if args.json {
        let output: Vec<serde_json::Value> = values
            .iter()
            .zip(&counts)
            .map(|(value, count)| {
                serde_json::json!({
                    "value": value.to_string(),
                    "files": count,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if values.is_empty() {
        println!("No values of '{attribute}' in the corpus.");
        return Ok(());
    }

    let rows: Vec<ValueRow> = values
        .iter()
        .zip(counts)
        .map(|(value, files)| ValueRow {
            value: value.to_string(),
            files,
            description: describe(value),
        })
        .collect();
    print_table(&rows);
    Ok(())
}

fn describe(value: &AttributeValue) -> String {
    match value {
        AttributeValue::BenchmarkName(name) => find_benchmark(name)
            .map(|info| format!("{} ({})", info.display_name, info.suite))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn print_summary(summary: &SelectionSummary) {
    println!("\n{} file(s)", summary.files);
    println!("Uncompressed: {} bytes", summary.size_uncompressed);
    if let Some(compressed) = summary.size_compressed {
        println!("Compressed:   {} bytes", compressed);
    }
}

pub fn execute_query(context: &BenchContext, args: QueryArgs) -> Result<()> {
    let spec = FilterSpec::parse_expressions(&args.filters)?;
    let entries = context.run_query(&spec)?;
    let summary = SelectionSummary::of(&entries);

    if args.json {
        let output = serde_json::json!({
            "summary": summary,
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No benchmark files match.");
        return Ok(());
    }

    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
    print_table(&rows);
    print_summary(&summary);
    Ok(())
}

pub fn execute_download(context: &BenchContext, args: DownloadArgs) -> Result<()> {
    let spec = FilterSpec::parse_expressions(&args.filters)?;
    let entries = context.run_query(&spec)?;
    if entries.is_empty() {
        anyhow::bail!("No benchmark files match; nothing to download");
    }

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "MNTBench_{}.zip",
            chrono::Local::now().format("%Y_%m_%d-%H_%M_%S")
        ))
    });

    let file = std::fs::File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    if let Err(e) = context.download_selection(&entries, file) {
        let _ = std::fs::remove_file(&output);
        return Err(e).with_context(|| format!("Failed to write {}", output.display()));
    }

    let summary = SelectionSummary::of(&entries);
    println!(
        "Wrote {} file(s) ({} bytes uncompressed) to {}",
        summary.files,
        summary.size_uncompressed,
        output.display()
    );
    Ok(())
}
