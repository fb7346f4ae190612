use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use eyre::{Context, Result, bail};
use serde_json::Value;
use tokio::fs::{create_dir_all, write};
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod chart;
mod hostinfo;
mod normalize;
mod report;
mod runner;

/// Run the fpcap benchmark executable and produce a comparison chart.
#[derive(Parser)]
struct Cli {
    /// Path to the benchmark executable
    #[arg(
        long,
        default_value = "cmake-build-release-visual-studio/fpcap_benchmark.exe"
    )]
    executable: PathBuf,
}

#[tokio::main]
async fn main() {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    tracing_subscriber::registry()
        .with(EnvFilter::new(format!("fpcap_bench={log_level}")))
        .with(
            layer()
                .with_writer(std::io::stderr)
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .init();

    let args = Cli::parse();
    if let Err(err) = run(args).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let output_dir =
        PathBuf::from("benchmarks").join(Local::now().format("%Y-%m-%d").to_string());
    create_dir_all(&output_dir)
        .await
        .context("create output directory")?;

    println!("Running benchmark: {}", args.executable.display());
    let mut report = runner::run_benchmark(&args.executable).await?;

    // Swap machine-specific context fields for portable host info.
    let host = hostinfo::collect();
    report.context.remove("host_name");
    report.context.remove("executable");
    report.context.insert("os".to_owned(), Value::String(host.os));
    report
        .context
        .insert("cpu_model".to_owned(), Value::String(host.cpu_model));
    report
        .context
        .insert("ram_total".to_owned(), Value::String(host.ram_total));

    let json_path = output_dir.join("benchmark_results.json");
    write(&json_path, serde_json::to_string_pretty(&report)?)
        .await
        .context("write benchmark report")?;
    println!("JSON saved to {}", json_path.display());

    let grouped = normalize::group_records(&report.benchmarks);
    if grouped.is_empty() {
        bail!("no benchmark results parsed");
    }
    println!(
        "Parsed {} results across {} format(s)",
        grouped.result_count(),
        grouped.format_count()
    );

    chart::render(&grouped, &output_dir.join("benchmark_results.png"))
}
