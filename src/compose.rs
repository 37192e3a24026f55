//! Interface to the container orchestration subsystem.
//!
//! Everything the orchestrator needs from Docker Compose sits behind the
//! `ContainerDriver` trait so the sequencer and bootstrap logic can be tested
//! against a scripted mock. The real implementation shells out to `docker`
//! and the `docker compose` plugin with the env-file map passed explicitly to
//! every invocation.

use std::collections::HashMap;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{CliError, Result};
use crate::readiness;

/// Captured result of running a command inside a service container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: message.into(),
        }
    }
}

/// Container lifecycle operations the orchestrator depends on.
///
/// `up`, `exec` and the probe are the bring-up path; the rest serve cleanup
/// and interrupt handling. Implementations must not retry internally — retry
/// policy lives in the readiness layer.
pub trait ContainerDriver {
    /// Bring the named services up, detached. Fatal on failure.
    async fn up(&self, services: &[&str]) -> Result<()>;

    /// Run a command inside a running service container. Spawn failures are
    /// folded into a failed `ExecOutput` so callers apply their own policy.
    async fn exec(&self, service: &str, command: &[&str]) -> ExecOutput;

    /// Stop all managed containers without removing them.
    async fn stop_all(&self) -> Result<()>;

    /// Stop and remove managed containers, including orphans.
    async fn down(&self, remove_orphans: bool) -> Result<()>;

    /// Remove an image by tag.
    async fn remove_image(&self, tag: &str) -> Result<()>;

    /// Prune dangling images and build cache.
    async fn prune(&self) -> Result<()>;

    /// Is anything accepting TCP connections on this externally mapped port?
    async fn port_open(&self, port: u16) -> bool;
}

/// Real driver: `docker` / `docker compose` subprocesses.
pub struct ComposeCli {
    env: HashMap<String, String>,
}

impl ComposeCli {
    pub fn new(env: HashMap<String, String>) -> Self {
        Self { env }
    }

    fn docker(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("docker");
        cmd.args(args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    async fn run(&self, args: &[&str]) -> Result<ExecOutput> {
        debug!("Running: docker {}", args.join(" "));
        let output = self
            .docker(args)
            .output()
            .await
            .map_err(|source| CliError::Spawn {
                program: format!("docker {}", args.join(" ")),
                source,
            })?;

        Ok(ExecOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run and turn a non-zero exit into a fatal error.
    async fn run_checked(&self, args: &[&str]) -> Result<()> {
        let out = self.run(args).await?;
        if out.success {
            Ok(())
        } else {
            Err(CliError::CommandFailed {
                command: format!("docker {}", args.join(" ")),
                stderr: out.stderr.trim().to_string(),
            })
        }
    }
}

impl ContainerDriver for ComposeCli {
    async fn up(&self, services: &[&str]) -> Result<()> {
        let mut args = vec!["compose", "up", "-d"];
        args.extend_from_slice(services);
        self.run_checked(&args).await
    }

    async fn exec(&self, service: &str, command: &[&str]) -> ExecOutput {
        // -T: no TTY allocation, we only want the exit status and output
        let mut args = vec!["compose", "exec", "-T", service];
        args.extend_from_slice(command);
        match self.run(&args).await {
            Ok(out) => out,
            Err(e) => ExecOutput::failure(e.to_string()),
        }
    }

    async fn stop_all(&self) -> Result<()> {
        self.run_checked(&["compose", "stop"]).await
    }

    async fn down(&self, remove_orphans: bool) -> Result<()> {
        let mut args = vec!["compose", "down"];
        if remove_orphans {
            args.push("--remove-orphans");
        }
        self.run_checked(&args).await
    }

    async fn remove_image(&self, tag: &str) -> Result<()> {
        self.run_checked(&["rmi", tag]).await
    }

    async fn prune(&self) -> Result<()> {
        self.run_checked(&["image", "prune", "-f"]).await?;
        self.run_checked(&["builder", "prune", "-f"]).await
    }

    async fn port_open(&self, port: u16) -> bool {
        readiness::port_open(port).await
    }
}

/// Verify the container engine and compose CLI exist and the daemon answers.
/// Each failure is fatal and names the check that failed.
pub async fn check_prerequisites() -> Result<()> {
    probe_tool("docker", &["--version"]).await?;
    probe_tool("docker compose", &["compose", "version"]).await?;

    let reachable = Command::new("docker")
        .arg("info")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);

    if reachable {
        Ok(())
    } else {
        Err(CliError::DaemonUnreachable)
    }
}

async fn probe_tool(label: &'static str, args: &[&str]) -> Result<()> {
    let ok = Command::new("docker")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);

    if ok {
        Ok(())
    } else {
        Err(CliError::ToolMissing(label))
    }
}
