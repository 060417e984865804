// =============================================================================
// probe.rs — ONE KNOCK ON ONE DOOR
// =============================================================================
//
// A probe is a single GET against one site's resolved URL. It gets exactly
// one attempt, a hard deadline, and an ear on the shared shutdown signal.
// Whichever of "response read", "deadline hit" or "shutdown" comes first
// wins, and the probe is over.
//
// Certificate validation is OFF for probes. A surprising number of sites run
// expired or self-signed certificates, and the question we are asking is
// "what does the page say", not "who signed the channel". The registry
// fetch keeps full validation.
// =============================================================================

use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::ProbeError;
use crate::matcher::is_match;
use crate::models::Site;

/// The Probe Runner. Cheap to clone; every clone shares one connection pool.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    /// Build a prober from the run configuration.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self::with_client(client, config.probe_timeout))
    }

    /// Wrap an existing client. `timeout` becomes the default per-probe bound.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `site` for `user` with the default timeout.
    pub async fn probe(
        &self,
        site: &Site,
        user: &str,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<bool, ProbeError> {
        self.probe_with_timeout(site, user, self.timeout, shutdown).await
    }

    /// Probe `site` for `user`, giving up after `timeout` or as soon as
    /// `shutdown` flips to `true`.
    ///
    /// `Ok(true)` means the exists signature matched. Every error means
    /// "no match" for this site and says why.
    pub async fn probe_with_timeout(
        &self,
        site: &Site,
        user: &str,
        timeout: Duration,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<bool, ProbeError> {
        let url = site.url_for_user(user);

        let target = Url::parse(&url).map_err(|source| ProbeError::InvalidUrl {
            url: url.clone(),
            source,
        })?;

        let request = self
            .client
            .get(target)
            .build()
            .map_err(|source| ProbeError::Request {
                url: url.clone(),
                source,
            })?;

        tokio::select! {
            biased;

            _ = cancelled(shutdown) => {
                debug!(site = %site.name, url = url.as_str(), "Probe cancelled");
                Err(ProbeError::Cancelled { url: url.clone() })
            }

            outcome = tokio::time::timeout(timeout, self.execute(request, site, &url)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(ProbeError::Timeout { url: url.clone(), after: timeout }),
                }
            }
        }
    }

    async fn execute(
        &self,
        request: reqwest::Request,
        site: &Site,
        url: &str,
    ) -> Result<bool, ProbeError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| ProbeError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();

        let body = response.bytes().await.map_err(|source| ProbeError::Body {
            url: url.to_string(),
            source,
        })?;

        let matched = is_match(status, &body, site);
        debug!(
            site = %site.name,
            url = url,
            status = status.as_u16(),
            body_len = body.len(),
            matched = matched,
            "Probe answered"
        );

        Ok(matched)
    }
}

/// Resolves once the shutdown flag is `true`. If every sender is gone the
/// flag can never flip, so this never resolves.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    let sender_gone = shutdown.wait_for(|stop| *stop).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}
