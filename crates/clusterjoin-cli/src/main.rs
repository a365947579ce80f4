//! clusterjoin CLI: join two CSV files on one key within a memory budget.

use clap::{Args, Parser, Subcommand};
use clusterjoin_core::config::{parse_delimiter, JoinConfig};
use clusterjoin_core::join::{JoinSpec, JoinType};
use clusterjoin_exec::{Engine, ExecError, PreparedJoin};
use clusterjoin_io::CsvWriter;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "clusterjoin")]
#[command(about = "Out-of-core single-key join of two CSV files with bounded memory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct JoinArgs {
    /// Left input file
    #[arg(long)]
    file1: PathBuf,

    /// Right input file
    #[arg(long)]
    file2: PathBuf,

    /// Key column present in both files
    #[arg(long)]
    col: String,

    /// Join kind: inner, left or right
    #[arg(long = "type", default_value = "inner")]
    join_type: String,

    /// Memory available to the join, in bytes (overrides config)
    #[arg(long)]
    memory_available: Option<usize>,

    /// Field delimiter for inputs and output (overrides config)
    #[arg(long)]
    delimiter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the two files and write the result to stdout
    Run {
        #[command(flatten)]
        join: JoinArgs,

        /// Force the cluster size in rows instead of estimating it
        #[arg(long)]
        cluster_size: Option<u64>,

        /// Abort when a chunk does not fit the memory budget
        #[arg(long)]
        enforce_budget: bool,

        /// Write the run manifest as JSON to this path
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Show the cluster plan without joining (EXPLAIN)
    Explain {
        #[command(flatten)]
        join: JoinArgs,

        /// Print the prepared join as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Settings given on the command line; each one beats the environment.
#[derive(Debug, Default, Clone)]
struct Overrides {
    memory_available: Option<usize>,
    cluster_size: Option<u64>,
    delimiter: Option<String>,
    enforce_budget: bool,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            join,
            cluster_size,
            enforce_budget,
            manifest,
        } => {
            let overrides = Overrides {
                memory_available: join.memory_available,
                cluster_size,
                delimiter: join.delimiter.clone(),
                enforce_budget,
            };
            run_join(&join, &overrides, manifest.as_deref())
        }
        Commands::Explain { join, json } => {
            let overrides = Overrides {
                memory_available: join.memory_available,
                delimiter: join.delimiter.clone(),
                ..Overrides::default()
            };
            explain_join(&join, &overrides, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// Logs go to stderr; stdout carries only the joined rows.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

/// 2 for inputs rejected before any output, 1 for everything else.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<ExecError>() {
        Some(e) if e.is_validation() => 2,
        _ => 1,
    }
}

fn apply_cli_overrides(
    cfg: &mut JoinConfig,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bytes) = overrides.memory_available {
        cfg.memory_available = bytes;
    }
    if let Some(rows) = overrides.cluster_size {
        cfg.cluster_size_override = Some(rows);
    }
    if let Some(d) = &overrides.delimiter {
        cfg.delimiter = parse_delimiter(d)?;
    }
    if overrides.enforce_budget {
        cfg.enforce_budget = true;
    }
    Ok(())
}

fn prepare(
    join: &JoinArgs,
    overrides: &Overrides,
) -> Result<(Engine, PreparedJoin), Box<dyn std::error::Error>> {
    let mut config = JoinConfig::from_env();
    apply_cli_overrides(&mut config, overrides).map_err(|e| ExecError::Config(e.to_string()))?;

    let join_type: JoinType = join.join_type.parse().map_err(ExecError::from)?;
    let spec = JoinSpec::new(join.col.clone(), join_type);

    let engine = Engine::new(config)?;
    let prepared = engine.prepare(&join.file1, &join.file2, spec)?;
    Ok((engine, prepared))
}

fn run_join(
    join: &JoinArgs,
    overrides: &Overrides,
    manifest_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, prepared) = prepare(join, overrides)?;

    let stdout = io::stdout();
    let mut writer = CsvWriter::with_delimiter(stdout.lock(), engine.config().delimiter);
    let manifest = engine.run(&prepared, &mut writer)?;
    writer.into_inner()?;

    tracing::info!(
        rows = manifest.stats.rows_written,
        batches = manifest.stats.batches_written,
        joins = manifest.stats.join_invocations,
        peak_bytes = manifest.stats.peak_accounted_bytes,
        duration_ms = manifest.duration_ms(),
        plan_hash = %manifest.plan_hash,
        "join finished"
    );

    if let Some(path) = manifest_path {
        fs::write(path, serde_json::to_string_pretty(&manifest)?)?;
    }
    Ok(())
}

fn explain_join(
    join: &JoinArgs,
    overrides: &Overrides,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, prepared) = prepare(join, overrides)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&prepared)?);
        return Ok(());
    }
    let memory = engine.config().memory_available;
    let est = &prepared.estimate;
    let plan = &est.plan;

    println!("Join Plan");
    println!("=========");
    println!();
    println!(
        "Memory Available: {} bytes ({:.2} MB)",
        memory,
        memory as f64 / 1_048_576.0
    );
    println!("Key: {} ({})", prepared.spec.key, prepared.spec.join_type);
    println!();
    for (label, ds) in [("Left", &prepared.left), ("Right", &prepared.right)] {
        println!("{}: {}", label, ds.path.display());
        println!("  Rows: {}", ds.nrows);
        println!(
            "  Bytes/Row: {:.1} (sampled {} rows)",
            ds.memory_per_row, ds.sampled_rows
        );
    }
    println!();
    println!("Cluster Plan:");
    println!("  Max Join Bytes/Row: {:.1}", est.max_join_memory_per_row);
    println!("  Memory Limit: {:.0} bytes", est.memory_limit);
    println!("  Max Cluster Size: {:.1} rows", est.max_cluster_size);
    println!(
        "  Cluster Size: {} rows{}",
        plan.cluster_size,
        if est.overridden {
            " (forced)"
        } else if est.degenerate {
            " (below granularity)"
        } else {
            ""
        }
    );
    println!(
        "  Clusters: {} left x {} right = {} pairs",
        plan.nclusters_left,
        plan.nclusters_right,
        plan.pair_count()
    );
    println!(
        "  Mode: {}",
        if plan.is_degenerate() {
            "degenerate (right table cached)"
        } else {
            "general (right chunks re-read per left chunk)"
        }
    );
    println!();
    println!("Left Clusters:");
    for c in plan.left_clusters() {
        println!("  {}. rows {}..={}", c.index + 1, c.range.low, c.range.high);
    }
    println!("Right Clusters:");
    for c in plan.right_clusters() {
        println!("  {}. rows {}..={}", c.index + 1, c.range.low, c.range.high);
    }
    println!();
    println!("Output Columns: {}", prepared.output_schema.columns.join(", "));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_cli_overrides, exit_code, JoinConfig, Overrides};
    use clusterjoin_exec::ExecError;
    use std::path::PathBuf;

    #[test]
    fn cli_overrides_replace_config_values() {
        let mut config = JoinConfig::default();
        let overrides = Overrides {
            memory_available: Some(4096),
            cluster_size: Some(2),
            delimiter: Some(";".into()),
            enforce_budget: true,
        };
        apply_cli_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.memory_available, 4096);
        assert_eq!(config.cluster_size_override, Some(2));
        assert_eq!(config.delimiter, b';');
        assert!(config.enforce_budget);
    }

    #[test]
    fn absent_overrides_keep_config() {
        let mut config = JoinConfig {
            memory_available: 1234,
            enforce_budget: true,
            ..JoinConfig::default()
        };
        apply_cli_overrides(&mut config, &Overrides::default()).unwrap();
        assert_eq!(config.memory_available, 1234);
        assert_eq!(config.cluster_size_override, None);
        assert!(config.enforce_budget);
    }

    #[test]
    fn bad_delimiter_is_rejected() {
        let mut config = JoinConfig::default();
        let overrides = Overrides {
            delimiter: Some("::".into()),
            ..Overrides::default()
        };
        assert!(apply_cli_overrides(&mut config, &overrides).is_err());
    }

    #[test]
    fn validation_errors_exit_with_two() {
        let err: Box<dyn std::error::Error> =
            Box::new(ExecError::InputNotFound(PathBuf::from("missing.csv")));
        assert_eq!(exit_code(err.as_ref()), 2);
        let err: Box<dyn std::error::Error> = Box::new(ExecError::Hash("boom".into()));
        assert_eq!(exit_code(err.as_ref()), 1);
    }
}
