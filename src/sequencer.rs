//! Staged bring-up of the managed services.
//!
//! Strictly sequential: each stage blocks on its readiness wait before the
//! next stage starts, so a service is only ever started after everything it
//! depends on reported ready. A failed wait aborts the whole run and leaves
//! already-started services running — partial state is diagnosable, automatic
//! teardown would mask the root cause.

use std::time::Duration;

use chrono::Local;
use colored::Colorize;
use tokio::time::sleep;

use crate::bootstrap;
use crate::compose::ContainerDriver;
use crate::config::{
    DeployConfig, ServiceSpec, APP_SERVER, CACHE, DATABASE, FRONTEND, PROXY, SCHEDULER, WORKER,
};
use crate::errors::Result;
use crate::readiness::{poll_until, PORT_ATTEMPTS, POLL_INTERVAL};

/// The task runners expose no readiness probe; they get a fixed settle delay
/// instead. Known gap inherited from the deployment this replaces.
const WORKER_SETTLE: Duration = Duration::from_secs(5);

pub struct Sequencer<'a, D: ContainerDriver> {
    driver: &'a D,
    config: &'a DeployConfig,
    poll_interval: Duration,
    port_attempts: u32,
    worker_settle: Duration,
}

impl<'a, D: ContainerDriver> Sequencer<'a, D> {
    pub fn new(driver: &'a D, config: &'a DeployConfig) -> Self {
        Self {
            driver,
            config,
            poll_interval: POLL_INTERVAL,
            port_attempts: PORT_ATTEMPTS,
            worker_settle: WORKER_SETTLE,
        }
    }

    #[cfg(test)]
    fn with_timing(mut self, interval: Duration, attempts: u32, settle: Duration) -> Self {
        self.poll_interval = interval;
        self.port_attempts = attempts;
        self.worker_settle = settle;
        self
    }

    /// Drive the full bring-up. Any readiness failure propagates and aborts.
    pub async fn run(&self) -> Result<()> {
        stage("Starting cache and database");
        self.driver.up(&[CACHE.name, DATABASE.name]).await?;
        self.wait_for_port(CACHE).await?;
        self.wait_for_port(DATABASE).await?;

        stage("Waiting for database to accept SQL");
        bootstrap::wait_for_sql(self.driver).await?;

        stage("Bootstrapping database (idempotent)");
        bootstrap::run_bootstrap(self.driver, self.config).await;

        stage("Starting application server");
        self.driver.up(&[APP_SERVER.name]).await?;
        self.wait_for_port(APP_SERVER).await?;

        stage("Starting background task runners (no readiness probe, settling)");
        self.driver.up(&[WORKER.name, SCHEDULER.name]).await?;
        sleep(self.worker_settle).await;

        stage("Starting web frontend");
        self.driver.up(&[FRONTEND.name]).await?;
        self.wait_for_port(FRONTEND).await?;

        stage("Starting reverse proxy");
        self.driver.up(&[PROXY.name]).await?;
        self.wait_for_port(PROXY).await?;

        stage("All services are up");
        Ok(())
    }

    async fn wait_for_port(&self, service: ServiceSpec) -> Result<()> {
        let Some(port) = service.port else {
            return Ok(());
        };

        let driver = self.driver;
        let what = format!("{} (port {})", service.name, port);
        poll_until(&what, self.poll_interval, self.port_attempts, || {
            driver.port_open(port)
        })
        .await?;

        println!("  {} {} is ready", "✓".green(), service.name);
        Ok(())
    }
}

/// Timestamped stage line, distinct from tracing diagnostics.
fn stage(message: &str) {
    let ts = Local::now().format("%H:%M:%S");
    println!("{} {}", format!("[{}]", ts).dimmed(), message.cyan().bold());
}
