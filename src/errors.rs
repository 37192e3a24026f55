use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Required tool not found on PATH: {0}")]
    ToolMissing(&'static str),

    #[error("Container daemon is not reachable. Is it running?")]
    DaemonUnreachable,

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed ({command}): {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("{what} not ready after {attempts} attempts")]
    ReadinessTimeout { what: String, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, CliError>;
