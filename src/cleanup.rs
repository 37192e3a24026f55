//! Pre-run cleanup of leftovers from earlier runs.
//!
//! Every sub-step failure here is swallowed: on a first run there is simply
//! nothing to clean, and a half-missing leftover must not block bring-up.
//! The ignore decision is made per call site, not by a blanket wrapper.

use std::io::{BufRead, Write};

use colored::Colorize;
use tracing::warn;

use crate::compose::ContainerDriver;
use crate::config::{CleanupMode, BACKEND_IMAGE};

/// Map a prompt answer to a cleanup decision. Default (empty input) is yes;
/// only an explicit "n"/"no" skips.
pub fn answer_to_mode(answer: &str) -> CleanupMode {
    match answer.trim().to_ascii_lowercase().as_str() {
        "n" | "no" => CleanupMode::Skip,
        _ => CleanupMode::Force,
    }
}

/// Ask the operator whether to clean up before starting. Read failure (e.g.
/// closed stdin) falls back to the default answer.
pub fn prompt_for_cleanup() -> CleanupMode {
    print!("Remove existing containers before starting? [Y/n] ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => answer_to_mode(&answer),
        Err(_) => CleanupMode::Force,
    }
}

/// Forced cleanup: tear down containers, drop the backend image, prune
/// dangling images and build cache.
pub async fn run_cleanup<D: ContainerDriver>(driver: &D) {
    println!("{}", "Cleaning up previous deployment...".yellow());

    if let Err(e) = driver.down(true).await {
        warn!("Teardown skipped: {}", e);
    }
    if let Err(e) = driver.remove_image(BACKEND_IMAGE).await {
        warn!("Backend image not removed (may not exist): {}", e);
    }
    if let Err(e) = driver.prune().await {
        warn!("Prune skipped: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockDriver;

    #[test]
    fn explicit_no_skips() {
        assert_eq!(answer_to_mode("n"), CleanupMode::Skip);
        assert_eq!(answer_to_mode("no"), CleanupMode::Skip);
        assert_eq!(answer_to_mode("  NO \n"), CleanupMode::Skip);
    }

    #[test]
    fn anything_else_forces() {
        assert_eq!(answer_to_mode(""), CleanupMode::Force);
        assert_eq!(answer_to_mode("\n"), CleanupMode::Force);
        assert_eq!(answer_to_mode("y"), CleanupMode::Force);
        assert_eq!(answer_to_mode("yes"), CleanupMode::Force);
        assert_eq!(answer_to_mode("whatever"), CleanupMode::Force);
    }

    #[tokio::test]
    async fn forced_cleanup_tears_down_and_prunes() {
        let driver = MockDriver::new();
        run_cleanup(&driver).await;

        let calls = driver.recorded();
        assert_eq!(calls[0], "down remove_orphans=true");
        assert!(calls[1].starts_with("remove_image"));
        assert!(calls[1].contains(BACKEND_IMAGE));
        assert_eq!(calls[2], "prune");
    }
}
