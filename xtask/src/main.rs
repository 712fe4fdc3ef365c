use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "bucket-deque workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deque benchmarks against std::collections::VecDeque
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

const BENCH: &str = "deque_benchmark";
const BASELINE_IMPL: &str = "std_vec_deque";
const IMPLS: &[&str] = &["bucket_deque", "std_vec_deque"];

/// workload -> implementation -> elements (or iterations) per second
type Results = BTreeMap<String, BTreeMap<String, f64>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Compiling benchmarks...");
    let status = Command::new("cargo")
        .args(["build", "--bench", BENCH, "--release"])
        .status()
        .context("failed to spawn cargo build")?;
    if !status.success() {
        anyhow::bail!("Failed to compile benchmarks");
    }

    println!("\n>>> Running {BENCH}");
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.env("CARGO_INCREMENTAL", "0");
    cmd.args(["bench", "--bench", BENCH]);

    // Args for the test runner (Criterion) go after --
    cmd.arg("--");
    if quick {
        cmd.args(["--measurement-time", "0.1", "--noplot", "--sample-size", "10"]);
    }

    let status = cmd.status().with_context(|| format!("failed to run {BENCH}"))?;
    if !status.success() {
        anyhow::bail!("Benchmark {BENCH} failed");
    }
    println!("Finished in {:.2?}", start.elapsed());

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    collect_results(criterion_dir, &mut results)?;

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("creating {}", report_path.display()))?;

    writeln!(file, "# BucketDeque Benchmark Report")?;
    writeln!(file)?;

    write!(file, "| Workload |")?;
    for name in IMPLS {
        write!(file, " {name} (Ops/s) | vs {BASELINE_IMPL} |")?;
    }
    writeln!(file)?;

    write!(file, "|---|")?;
    for _ in IMPLS {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    for (workload, by_impl) in &results {
        write!(file, "| {workload} |")?;
        let baseline = by_impl.get(BASELINE_IMPL).copied().unwrap_or(0.0);

        for name in IMPLS {
            match by_impl.get(*name) {
                Some(ops) => {
                    let rel = if baseline > 0.0 { ops / baseline } else { 0.0 };
                    write!(file, " {} | **{rel:.2}x** |", format_ops(*ops))?;
                }
                None => write!(file, " N/A | - |")?,
            }
        }
        writeln!(file)?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|s| s.to_str()).map(str::to_owned)
}

/// Walks criterion's `<group>/<function>/new/estimates.json` layout.
fn collect_results(dir: &Path, results: &mut Results) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Ok(()),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(&path, results)?;
            continue;
        }
        if dir_name(&path).as_deref() != Some("estimates.json") {
            continue;
        }

        let Some(run_dir) = path.parent() else { continue };
        if dir_name(run_dir).as_deref() != Some("new") {
            continue;
        }
        let Some(impl_dir) = run_dir.parent() else { continue };
        let Some(workload_dir) = impl_dir.parent() else { continue };
        let (Some(impl_name), Some(workload)) = (dir_name(impl_dir), dir_name(workload_dir)) else {
            continue;
        };
        if impl_name == "report" || workload == "report" {
            continue;
        }

        // Throughput, when the group declared one, lives next to the estimates.
        let mut elements = 1.0;
        let bench_json = run_dir.join("benchmark.json");
        if let Ok(content) = fs::read_to_string(&bench_json) {
            let json: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", bench_json.display()))?;
            if let Some(t) = json.get("throughput").and_then(|t| t.get("Elements")) {
                elements = t.as_f64().unwrap_or(1.0);
            }
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        let time_ns = json
            .get("mean")
            .and_then(|m| m.get("point_estimate"))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0);
        if time_ns > 0.0 {
            results
                .entry(workload)
                .or_default()
                .insert(impl_name, elements * 1e9 / time_ns);
        }
    }

    Ok(())
}
