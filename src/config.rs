//! Resolved deployment configuration.
//!
//! All tunables come from the optional `.env` file in the working directory;
//! everything has a built-in default so a bare checkout starts out of the box.
//! The struct is built once at startup and passed by reference to every
//! stage — nothing mutates the process environment.

use std::collections::HashMap;

/// Administrative superuser the database image is provisioned with.
pub const ADMIN_DB_USER: &str = "postgres";

/// Image tag the application server is pulled as; pruned on forced cleanup.
pub const BACKEND_IMAGE: &str = "taskboard/backend:latest";

/// What to do with containers left over from a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Leave existing containers alone.
    Skip,
    /// Tear down containers and prune stale images without asking.
    Force,
    /// Ask the operator (default yes).
    Prompt,
}

impl CleanupMode {
    pub fn from_flags(no_cleanup: bool, force_cleanup: bool) -> Self {
        if no_cleanup {
            CleanupMode::Skip
        } else if force_cleanup {
            CleanupMode::Force
        } else {
            CleanupMode::Prompt
        }
    }
}

/// A compose-managed service and the externally mapped port we probe for
/// readiness. `port: None` means the service has no probe (see sequencer).
#[derive(Debug, Clone, Copy)]
pub struct ServiceSpec {
    pub name: &'static str,
    pub port: Option<u16>,
}

pub const CACHE: ServiceSpec = ServiceSpec { name: "redis", port: Some(6380) };
pub const DATABASE: ServiceSpec = ServiceSpec { name: "postgres", port: Some(5433) };
pub const APP_SERVER: ServiceSpec = ServiceSpec { name: "backend", port: Some(8080) };
pub const WORKER: ServiceSpec = ServiceSpec { name: "worker", port: None };
pub const SCHEDULER: ServiceSpec = ServiceSpec { name: "scheduler", port: None };
pub const FRONTEND: ServiceSpec = ServiceSpec { name: "frontend", port: Some(3100) };
pub const PROXY: ServiceSpec = ServiceSpec { name: "nginx", port: Some(8081) };

/// Immutable per-run configuration, resolved once from the env file.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub frontend_url: String,
    pub backend_url: String,
}

impl DeployConfig {
    pub fn from_env_map(env: &HashMap<String, String>) -> Self {
        let get = |key: &str, default: &str| -> String {
            env.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            db_name: get("DB_NAME", "taskboard"),
            db_user: get("DB_USER", "taskboard"),
            db_password: get("DB_PASSWORD", "taskboard"),
            frontend_url: get("FRONTEND_URL", "http://localhost:3100"),
            backend_url: get("BACKEND_URL", "http://localhost:8080"),
        }
    }

    /// True when the application connects as the administrative superuser,
    /// in which case bootstrap must not try to create a separate role.
    pub fn app_user_is_admin(&self) -> bool {
        self.db_user == ADMIN_DB_USER
    }
}
