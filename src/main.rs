mod bootstrap;
mod cleanup;
mod compose;
mod config;
mod env_file;
mod errors;
mod readiness;
mod sequencer;

#[cfg(test)]
mod test_support;

use std::path::Path;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::compose::{ComposeCli, ContainerDriver};
use crate::config::{CleanupMode, DeployConfig, CACHE, DATABASE, PROXY};
use crate::errors::Result;
use crate::sequencer::Sequencer;

/// Stackup - staged bring-up for the Taskboard container stack
#[derive(Parser, Debug)]
#[command(name = "stackup")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Leave containers from a previous run alone
    #[arg(short = 'n', long = "no-cleanup", conflicts_with = "force_cleanup")]
    pub no_cleanup: bool,

    /// Remove existing containers and prune stale images without asking
    #[arg(short = 'f', long = "force-cleanup")]
    pub force_cleanup: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Help and version displays exit 0; any parse failure exits 1.
fn parse_error_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(parse_error_code(&e));
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    compose::check_prerequisites().await?;

    let env = env_file::load_env_file(Path::new(".env"));
    let config = DeployConfig::from_env_map(&env);

    let mode = match CleanupMode::from_flags(cli.no_cleanup, cli.force_cleanup) {
        // Blocking stdin read; runs on the blocking pool so the runtime
        // thread stays free. A failed join falls back to the default answer.
        CleanupMode::Prompt => tokio::task::spawn_blocking(cleanup::prompt_for_cleanup)
            .await
            .unwrap_or(CleanupMode::Force),
        resolved => resolved,
    };

    let driver = ComposeCli::new(env);

    let interrupted = tokio::select! {
        result = bring_up(&driver, &config, mode) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        // Best effort, not retried; the operator gets their prompt back either way
        eprintln!("\n{}", "Interrupted, stopping services...".yellow());
        if let Err(e) = driver.stop_all().await {
            warn!("Stop on interrupt failed: {}", e);
        }
        std::process::exit(1);
    }

    print_summary(&config);
    Ok(())
}

async fn bring_up<D: ContainerDriver>(
    driver: &D,
    config: &DeployConfig,
    mode: CleanupMode,
) -> Result<()> {
    if mode == CleanupMode::Force {
        cleanup::run_cleanup(driver).await;
    }
    Sequencer::new(driver, config).run().await
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "ENDPOINT")]
    endpoint: &'static str,
    #[tabled(rename = "ADDRESS")]
    address: String,
}

fn print_summary(config: &DeployConfig) {
    let mut rows = vec![
        EndpointRow {
            endpoint: "Web frontend",
            address: config.frontend_url.clone(),
        },
        EndpointRow {
            endpoint: "API",
            address: config.backend_url.clone(),
        },
    ];
    if let Some(port) = PROXY.port {
        rows.push(EndpointRow {
            endpoint: "Reverse proxy",
            address: format!("http://localhost:{}", port),
        });
    }
    if let Some(port) = DATABASE.port {
        rows.push(EndpointRow {
            endpoint: "Database",
            address: format!("localhost:{}", port),
        });
    }
    if let Some(port) = CACHE.port {
        rows.push(EndpointRow {
            endpoint: "Cache",
            address: format!("localhost:{}", port),
        });
    }

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("\n{table}");

    println!("\nManagement:");
    println!("  docker compose ps            service status");
    println!("  docker compose logs -f NAME  follow a service's logs");
    println!("  docker compose down          stop and remove everything");
}
