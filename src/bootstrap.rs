//! Database readiness and idempotent bootstrap.
//!
//! Two phases, distinct from the generic port wait because PostgreSQL accepts
//! TCP connections before it can serve SQL:
//!
//! 1. readiness — poll `SELECT 1` through `compose exec` until it succeeds;
//!    exhaustion aborts the run.
//! 2. bootstrap — create the application database and role only where absent,
//!    then grant privileges. Safe to run on every startup; a failure here is
//!    assumed to mean "already applied" and never blocks bring-up.

use std::time::Duration;

use tracing::{info, warn};

use crate::compose::ContainerDriver;
use crate::config::{DeployConfig, ADMIN_DB_USER, DATABASE};
use crate::errors::Result;
use crate::readiness::poll_until;

/// SQL readiness gets a smaller budget than port waits; by the time the port
/// answers, the server is already most of the way up.
pub const SQL_ATTEMPTS: u32 = 30;

const SQL_INTERVAL: Duration = Duration::from_secs(2);

/// Phase 1: block until the server answers a trivial query, or abort.
pub async fn wait_for_sql<D: ContainerDriver>(driver: &D) -> Result<u32> {
    poll_until("database SQL interface", SQL_INTERVAL, SQL_ATTEMPTS, move || async move {
        driver
            .exec(DATABASE.name, &psql_args("SELECT 1"))
            .await
            .success
    })
    .await
}

/// Phase 2: idempotent bootstrap. Never fatal.
pub async fn run_bootstrap<D: ContainerDriver>(driver: &D, cfg: &DeployConfig) {
    // CREATE DATABASE cannot run inside a transaction block, so existence is
    // checked with a separate query instead of a DO guard.
    let exists = driver
        .exec(DATABASE.name, &psql_args(&database_exists_query(cfg)))
        .await;

    let database_present = exists.success && exists.stdout.trim() == "1";
    if database_present {
        info!("Database {} already exists", cfg.db_name);
    } else {
        let created = driver
            .exec(DATABASE.name, &psql_args(&create_database_sql(cfg)))
            .await;
        if created.success {
            info!("Created database {}", cfg.db_name);
        } else {
            warn!(
                "Database creation failed (may already be done): {}",
                created.stderr.trim()
            );
        }
    }

    if let Some(sql) = role_bootstrap_sql(cfg) {
        let granted = driver.exec(DATABASE.name, &psql_args(&sql)).await;
        if granted.success {
            info!("Ensured role {} with privileges on {}", cfg.db_user, cfg.db_name);
        } else {
            warn!(
                "Role bootstrap failed (may already be done): {}",
                granted.stderr.trim()
            );
        }
    }
}

/// psql invocation against the administrative database, tuple-only output so
/// existence checks can read bare values from stdout.
fn psql_args(sql: &str) -> [&str; 8] {
    ["psql", "-U", ADMIN_DB_USER, "-d", "postgres", "-tA", "-c", sql]
}

fn database_exists_query(cfg: &DeployConfig) -> String {
    format!(
        "SELECT 1 FROM pg_database WHERE datname = '{}'",
        quote_literal(&cfg.db_name)
    )
}

fn create_database_sql(cfg: &DeployConfig) -> String {
    format!("CREATE DATABASE \"{}\"", quote_ident(&cfg.db_name))
}

/// Role creation and grants, guarded so repeated runs are no-ops. `None` when
/// the application connects as the administrative superuser.
fn role_bootstrap_sql(cfg: &DeployConfig) -> Option<String> {
    if cfg.app_user_is_admin() {
        return None;
    }

    Some(format!(
        "DO $$ BEGIN \
           IF NOT EXISTS (SELECT FROM pg_roles WHERE rolname = '{user_lit}') THEN \
             CREATE ROLE \"{user}\" LOGIN PASSWORD '{password}'; \
           END IF; \
         END $$; \
         GRANT ALL PRIVILEGES ON DATABASE \"{db}\" TO \"{user}\"; \
         ALTER ROLE \"{user}\" CREATEDB;",
        user_lit = quote_literal(&cfg.db_user),
        user = quote_ident(&cfg.db_user),
        password = quote_literal(&cfg.db_password),
        db = quote_ident(&cfg.db_name),
    ))
}

/// Double embedded single quotes so config values are safe inside a
/// string literal.
fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Double embedded double quotes so config values are safe inside a
/// quoted identifier.
fn quote_ident(value: &str) -> String {
    value.replace('"', "\"\"")
}
