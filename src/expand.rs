//! Environment variable expansion for extracted configuration strings.
//!
//! Compose files lean heavily on `${VAR}` references for ports, volume
//! paths, and hostnames. The core pipeline passes those through verbatim;
//! expansion happens only on strings leaving a relation extractor, and only
//! when requested. Variables without a value in the process environment are
//! left untouched so an unresolved `${HOST_PORT}` stays visible in the
//! rendered graph instead of collapsing to an empty string.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Expand `${VAR}` and `$VAR` references against the process environment.
///
/// Unset variables are left as written.
pub fn expand_vars(raw: &str) -> String {
    shellexpand::env_with_context_no_errors(raw, |var| std::env::var(var).ok()).into_owned()
}

/// Load variables from a dotenv file into the process environment.
///
/// Later expansion picks these up exactly like real environment variables;
/// variables already set in the environment keep their value.
pub fn load_env_file(path: &Path) -> Result<()> {
    debug!(path = %path.display(), "loading dotenv file");
    dotenv::from_path(path)
        .with_context(|| format!("failed to load env file '{}'", path.display()))
}
