use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use iamscan_core::{Outcome, ScanConfig};
use iamscan_policy::{scenarios, Scanner};

#[derive(Parser, Debug)]
#[command(author, version, about="iamscan — flag IAM policies that grant \"Resource\": \"*\"")]
struct Cli {
    /// Policy document to verify (JSON)
    #[arg(required_unless_present = "run_unit_tests")]
    policy: Option<PathBuf>,

    /// Run the built-in scenario suite instead of scanning a file
    #[arg(long = "run_unit_tests", conflicts_with = "policy")]
    run_unit_tests: bool,

    /// Scanner config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat missing PolicyDocument/Statement and non-object statements as malformed
    #[arg(long, default_value_t=false)]
    strict: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t=Format::Text)]
    format: Format,

    /// Emit logs as JSON
    #[arg(long, default_value_t=false)]
    log_json: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum Format { Text, Json }

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    if json { fmt.json().init() } else { fmt.init() }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    let Some(path) = path else { return Ok(ScanConfig::default()) };
    let raw = std::fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    serde_yaml::from_slice(&raw).with_context(|| format!("parse config {}", path.display()))
}

fn run_scenarios() -> ExitCode {
    let results = scenarios::run();
    let failed = results.iter().filter(|r| !r.passed()).count();
    for r in &results {
        if r.passed() {
            println!("{} ... ok", r.name);
        } else {
            println!("{} ... FAILED (expected {}, got {}: {})", r.name, r.expected, r.outcome.kind(), r.outcome.diagnostic());
        }
    }
    println!();
    println!("{} passed; {} failed", results.len() - failed, failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn report(path: &Path, outcome: &Outcome, format: Format) -> Result<()> {
    match format {
        Format::Text => {
            println!("{}", outcome.diagnostic());
            println!("Result of verification of given Json file: {}", outcome.verdict());
        }
        Format::Json => {
            let mut out = json!({
                "file": path.display().to_string(),
                "result": outcome.verdict(),
                "outcome": outcome.kind(),
                "diagnostic": outcome.diagnostic(),
            });
            match outcome {
                Outcome::Unsafe { statement } => out["statement"] = json!(statement),
                Outcome::Safe { omission: Some(o) } => out["omission"] = json!(o),
                _ => {}
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if cli.run_unit_tests {
        return Ok(run_scenarios());
    }

    let mut cfg = load_config(cli.config.as_deref())?;
    cfg.strict |= cli.strict;
    let scanner = Scanner::from_config(&cfg);

    let Some(path) = cli.policy else {
        anyhow::bail!("no policy file given");
    };
    let outcome = scanner.scan_file(&path);
    tracing::info!(file = %path.display(), outcome = %outcome.kind(), "scan finished");
    report(&path, &outcome, cli.format)?;
    Ok(ExitCode::SUCCESS)
}
