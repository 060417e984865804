// =============================================================================
// registry.rs — THE GUEST LIST
// =============================================================================
//
// Before we can knock on any doors we need to know which doors exist. The
// registry is one JSON document with a `sites` array. We fetch it, parse
// it, and refuse to go any further if it is missing, broken, or empty. A
// half-trusted guest list is worse than none.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::RegistryError;
use crate::models::{Registry, RegistryDocument};

/// Load the registry from `source`, which is either an http(s) URL or a
/// path to a local JSON file.
pub async fn load(source: &str, timeout: Duration) -> Result<Registry, RegistryError> {
    if is_remote(source) {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source_err| RegistryError::Fetch {
                url: source.to_string(),
                source: source_err,
            })?;
        from_url(&client, source).await
    } else {
        from_file(source).await
    }
}

/// Fetch and parse the registry at `url`. Any non-2xx answer is fatal.
pub async fn from_url(client: &reqwest::Client, url: &str) -> Result<Registry, RegistryError> {
    debug!(url = url, "Fetching site registry");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| RegistryError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RegistryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|source| RegistryError::Body {
        url: url.to_string(),
        source,
    })?;

    let registry = parse(&body)?;
    info!(url = url, sites = registry.len(), "📋 Site registry loaded");
    Ok(registry)
}

/// Read and parse a registry stored on disk.
pub async fn from_file(path: impl AsRef<Path>) -> Result<Registry, RegistryError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading site registry from file");

    let body = tokio::fs::read(path)
        .await
        .map_err(|source| RegistryError::File {
            path: path.to_path_buf(),
            source,
        })?;

    let registry = parse(&body)?;
    info!(path = %path.display(), sites = registry.len(), "📋 Site registry loaded");
    Ok(registry)
}

/// Parse a registry document. Zero sites is an error, not an empty run.
pub fn parse(bytes: &[u8]) -> Result<Registry, RegistryError> {
    let document: RegistryDocument = serde_json::from_slice(bytes)?;

    if document.sites.is_empty() {
        return Err(RegistryError::Empty);
    }

    Ok(Registry::new(document.sites))
}

fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
