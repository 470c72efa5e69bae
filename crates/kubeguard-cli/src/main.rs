//! CLI entry point for kubeguard.
//!
//! This module is intentionally thin: it handles argument parsing, the
//! connection banner, progress output, and exit codes. Scan logic lives in
//! the `kubeguard-scan` crate, rendering in `kubeguard-report`.
//!
//! Stdout carries the rendered report only; everything else (banner,
//! progress, warnings) goes to stderr so `-o json` output stays pipeable.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use kubeguard_cluster::{ClusterAccess, ClusterIdentity, KubeClient, kubeconfig};
use kubeguard_report::{TextRenderer, build_report, to_json};
use kubeguard_scan::{ScanEvent, ScanOutcome, ScanTarget, Scanner};
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;

/// Set by the Ctrl-C handler; the scanner checks it between checkers.
static CANCELLED: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(
    name = "kubeguard",
    version,
    about = "Read-only Kubernetes cluster security scanner"
)]
struct Cli {
    /// Scan a single namespace instead of the whole cluster.
    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Report output format.
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Save the JSON report to this path (requires `--output json`).
    #[arg(short = 'f', long)]
    file: Option<Utf8PathBuf>,

    /// Explicit kubeconfig path (defaults to $KUBECONFIG, then ~/.kube/config).
    #[arg(long)]
    kubeconfig: Option<Utf8PathBuf>,

    /// Disable colorized output.
    #[arg(long)]
    no_color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("kubeguard: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    if cli.file.is_some() && cli.output != OutputFormat::Json {
        anyhow::bail!("--file requires --output json");
    }

    let color = !cli.no_color;

    let client = match connect(cli, color) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Failed to connect to cluster: {err:#}");
            return Ok(1);
        }
    };

    if let Err(err) = ctrlc::set_handler(|| CANCELLED.store(true, Ordering::SeqCst)) {
        log::warn!("could not install Ctrl-C handler: {err}");
    }

    let target = match &cli.namespace {
        Some(namespace) => ScanTarget::Namespace(namespace.clone()),
        None => ScanTarget::All,
    };

    let scanner = Scanner::new(&client).with_cancel(&CANCELLED);
    let outcome = scanner
        .run_with(&target, &mut progress)
        .context("scan failed")?;

    let scan = match outcome {
        ScanOutcome::Completed(scan) => scan,
        ScanOutcome::Interrupted => {
            eprintln!("Scan interrupted; no report produced.");
            return Ok(0);
        }
    };

    if !scan.failures.is_empty() {
        eprintln!(
            "warning: {} checker(s) failed; results may be incomplete",
            scan.failures.len()
        );
    }
    eprintln!("Scan complete: {} finding(s)\n", scan.findings.len());

    match cli.output {
        OutputFormat::Text => {
            print!("{}", TextRenderer::new(color).render(&scan.findings));
        }
        OutputFormat::Json => {
            let report = build_report(
                scan.findings,
                env!("CARGO_PKG_VERSION"),
                OffsetDateTime::now_utc(),
            );
            let json = to_json(&report).context("serialize report")?;
            println!("{json}");

            if let Some(path) = &cli.file {
                // A failed save must not discard the report already on stdout.
                match write_report_file(path, &json) {
                    Ok(()) => eprintln!("Report saved to {path}"),
                    Err(err) => eprintln!("Failed to save report to {path}: {err:#}"),
                }
            }
        }
    }

    Ok(0)
}

/// Resolves the kubeconfig, connects, and probes the cluster. The identity
/// probe doubles as the connectivity check so auth failures surface before
/// the scan starts.
fn connect(cli: &Cli, color: bool) -> anyhow::Result<KubeClient> {
    let config = kubeconfig::load(cli.kubeconfig.as_deref()).context("load kubeconfig")?;
    let client = KubeClient::connect(config).context("build API client")?;
    let identity = client.cluster_identity().context("reach API server")?;
    banner(&identity, color);
    Ok(client)
}

fn banner(identity: &ClusterIdentity, color: bool) {
    let title = "Kubeguard - Kubernetes Security Scanner";
    if color {
        eprintln!("{}", title.green().bold());
    } else {
        eprintln!("{title}");
    }
    eprintln!("Cluster: {} ({})", identity.name, identity.server);
    eprintln!("Kubernetes version: {}", identity.version);
    eprintln!();
}

fn progress(event: ScanEvent) {
    match event {
        ScanEvent::NamespacesResolved(count) => {
            eprintln!("Scanning {count} namespace(s)...");
        }
        ScanEvent::CheckerStarted(name) => eprintln!("Running {name} checks..."),
        ScanEvent::CheckerFinished(name, count) => {
            eprintln!("  {name}: {count} finding(s)");
        }
        ScanEvent::CheckerFailed(name, error) => {
            eprintln!("  {name}: failed: {error}");
        }
    }
}

fn write_report_file(path: &Utf8Path, json: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, json).with_context(|| format!("write report: {path}"))?;
    Ok(())
}
