use std::{io, path::Path, process::Output};

use async_trait::async_trait;
use eyre::{Context, Result, bail};
use tokio::process::Command;

use crate::report::BenchmarkReport;

const JSON_FORMAT_FLAG: &str = "--benchmark_format=json";

/// Seam around the external process so the runner can be driven by a
/// fake in tests.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, executable: &Path) -> io::Result<Output>;
}

/// Runs the real executable via tokio, capturing both streams.
pub struct SystemInvoker;

#[async_trait]
impl Invoker for SystemInvoker {
    async fn invoke(&self, executable: &Path) -> io::Result<Output> {
        Command::new(executable).arg(JSON_FORMAT_FLAG).output().await
    }
}

/// Runs the benchmark executable once and parses its JSON report.
pub async fn run_benchmark(executable: &Path) -> Result<BenchmarkReport> {
    run_benchmark_with(&SystemInvoker, executable).await
}

pub async fn run_benchmark_with(
    invoker: &dyn Invoker,
    executable: &Path,
) -> Result<BenchmarkReport> {
    ensure_unlocked(executable)?;

    let output = match invoker.invoke(executable).await {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            bail!("executable not found: {}", executable.display())
        }
        Err(err) => {
            return Err(err).context(format!("run benchmark {}", executable.display()));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            bail!("benchmark exited with {}", output.status);
        }
        bail!("benchmark exited with {}\n{stderr}", output.status);
    }

    serde_json::from_slice(&output.stdout).context("parse benchmark report")
}

/// A benchmark binary still held open by a debugger or IDE cannot be
/// executed on Windows; an append-mode open probe detects that early.
#[cfg(windows)]
fn ensure_unlocked(executable: &Path) -> Result<()> {
    match std::fs::OpenOptions::new().append(true).open(executable) {
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => bail!(
            "'{}' is locked by another process; close any programs using it (debugger, IDE, etc.) and retry",
            executable.display()
        ),
        _ => Ok(()),
    }
}

#[cfg(not(windows))]
fn ensure_unlocked(_executable: &Path) -> Result<()> {
    Ok(())
}
