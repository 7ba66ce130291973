//! Optional tracing setup for binaries and tests.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{Result, SedgeError};

/// Installs a global subscriber with the given env-filter directive
/// (e.g. `"sedge=debug"`). Call at most once per process.
pub fn init_logging(filter: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(filter)
                .map_err(|_| SedgeError::InvalidConfig("invalid log filter"))?,
        )
        .with_target(true)
        .try_init()
        .map_err(|_| SedgeError::InvalidConfig("logging already initialized"))
}
