//! Fixed-interval readiness polling.
//!
//! Every staged bring-up step blocks on `poll_until` before the next stage
//! may start. Fixed-interval polling is deliberate: container startup latency
//! is small and bounded, so adaptive backoff buys nothing here.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::errors::{CliError, Result};

/// Interval between readiness probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default attempt budget for TCP port waits.
pub const PORT_ATTEMPTS: u32 = 50;

/// Per-attempt connect timeout for TCP probes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Run `probe` up to `max_attempts` times, `interval` apart, until it returns
/// true. Returns the 1-based attempt that succeeded, or
/// `CliError::ReadinessTimeout` after exactly `max_attempts` failures.
pub async fn poll_until<F, Fut>(
    what: &str,
    interval: Duration,
    max_attempts: u32,
    mut probe: F,
) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=max_attempts {
        if probe().await {
            debug!("{} ready after {} attempt(s)", what, attempt);
            return Ok(attempt);
        }
        if attempt < max_attempts {
            sleep(interval).await;
        }
    }

    Err(CliError::ReadinessTimeout {
        what: what.to_string(),
        attempts: max_attempts,
    })
}

/// One-shot TCP probe: is anything accepting connections on this local port?
pub async fn port_open(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    matches!(timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await, Ok(Ok(_)))
}

#[cfg(test)]
mod tests;
