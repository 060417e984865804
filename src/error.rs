// =============================================================================
// error.rs — EVERY WAY THIS CAN GO WRONG
// =============================================================================
//
// Two kinds of failure live here. Registry failures are fatal: if we can't
// trust the list of sites, we don't probe anything. Probe failures are
// local: one site falling over is that site's problem, never the run's.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while loading the site registry. All of them abort the run
/// before a single probe is sent.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unable to get sites from '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry at '{url}' answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unable to read registry body from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unable to read registry file '{}': {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse registry: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no sites found in registry")]
    Empty,
}

/// Failures of a single probe. Each one means "no match" for that site and
/// nothing more.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unable to create request for '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unable to build request for '{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unable to perform request to '{url}': {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to '{url}' timed out after {}ms", .after.as_millis())]
    Timeout { url: String, after: Duration },

    #[error("request to '{url}' was cancelled")]
    Cancelled { url: String },

    #[error("error reading response body from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ProbeError {
    /// The resolved URL the failing probe was aimed at.
    pub fn url(&self) -> &str {
        match self {
            ProbeError::InvalidUrl { url, .. }
            | ProbeError::Request { url, .. }
            | ProbeError::Transport { url, .. }
            | ProbeError::Timeout { url, .. }
            | ProbeError::Cancelled { url }
            | ProbeError::Body { url, .. } => url,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProbeError::Cancelled { .. })
    }
}

/// Run-level failures. These are the ones that end the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("user is empty")]
    EmptyUsername,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
