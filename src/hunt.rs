// =============================================================================
// hunt.rs — THE WAR ROOM
// =============================================================================
//
// One username, several hundred sites, one tokio task per site, all of them
// launched before the first one has even resolved DNS. Every task owns its
// own Arc'd Site, its own clone of the shutdown receiver, and a sender into
// one shared channel. When the last task drops its sender the channel closes,
// and that is how we know the run is over. No counters to wait on, no
// barriers, no locks held across a single byte of network I/O.
//
// Results come out in whatever order the internet decides. A site that takes
// forty seconds to time out never holds up the one that answered in forty
// milliseconds.
// =============================================================================

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::Stream;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{EngineError, RegistryError, Result};
use crate::models::{PositiveMatch, ProbeOutcome, Site};
use crate::probe::Prober;
use crate::registry;
use crate::stats::{RunSnapshot, RunStats};

/// Per-run knobs for the fan-out.
#[derive(Debug, Clone, Default)]
pub struct HuntOptions {
    /// Per-probe timeout. `None` uses the prober's default.
    pub timeout: Option<Duration>,

    /// Cap on probes in flight. `None` means one per site, all at once.
    pub max_concurrency: Option<usize>,
}

impl HuntOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Some(config.probe_timeout),
            max_concurrency: config.max_concurrency,
        }
    }
}

/// Every probe outcome of one run, in completion order. Ends once every
/// launched probe has reported back.
pub struct ProbeStream {
    receiver: mpsc::UnboundedReceiver<ProbeOutcome>,
    stats: Arc<RunStats>,
}

impl ProbeStream {
    pub async fn next_outcome(&mut self) -> Option<ProbeOutcome> {
        self.receiver.recv().await
    }

    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }
}

impl Stream for ProbeStream {
    type Item = ProbeOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// An empty username would turn every probe URL into the site's index page.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(EngineError::EmptyUsername);
    }
    Ok(())
}

/// Launch one probe task per site and hand back the stream of their outcomes.
///
/// Must be called from inside a tokio runtime. Flipping `shutdown` to `true`
/// cancels every probe still in flight; they still report back, as
/// cancellations, so the stream always ends.
pub fn enumerate(
    prober: &Prober,
    sites: impl IntoIterator<Item = Site>,
    username: &str,
    options: &HuntOptions,
    shutdown: &watch::Receiver<bool>,
) -> Result<ProbeStream> {
    validate_username(username)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<ProbeOutcome>();
    let stats = Arc::new(RunStats::new());
    let limiter = options
        .max_concurrency
        .map(|limit| Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS))));
    let timeout = options.timeout.unwrap_or_else(|| prober.timeout());
    let username: Arc<str> = Arc::from(username);

    for site in sites {
        let site = Arc::new(site);
        let task_prober = prober.clone();
        let task_tx = event_tx.clone();
        let task_stats = Arc::clone(&stats);
        let task_limiter = limiter.clone();
        let task_user = Arc::clone(&username);
        let mut task_shutdown = shutdown.clone();

        stats.record_launch();
        tokio::spawn(async move {
            // Semaphore is FIFO: whoever queues first gets the next permit,
            // so a waiting probe is never skipped over.
            let _permit = match task_limiter {
                Some(limiter) => limiter.acquire_owned().await.ok(),
                None => None,
            };

            let started = Instant::now();
            let url = site.url_for_user(&task_user);
            let result = task_prober
                .probe_with_timeout(&site, &task_user, timeout, &mut task_shutdown)
                .await;

            let outcome = ProbeOutcome {
                site,
                url,
                result,
                elapsed: started.elapsed(),
            };
            task_stats.record_outcome(&outcome);

            // The consumer may have stopped listening. Nothing to do about it.
            let _ = task_tx.send(outcome);
        });
    }

    // Only the tasks hold senders now, so the stream ends with the last one.
    drop(event_tx);

    debug!(
        probes = stats.snapshot().launched,
        timeout_ms = timeout.as_millis() as u64,
        max_concurrency = ?options.max_concurrency,
        "🚀 All probes launched"
    );

    Ok(ProbeStream {
        receiver: event_rx,
        stats,
    })
}

/// Log one outcome at the level it deserves. Errors are somebody else's
/// outage, so they never go above `warn`.
pub fn log_outcome(outcome: &ProbeOutcome) {
    match &outcome.result {
        Ok(true) => info!(
            site = %outcome.site.name,
            url = outcome.url.as_str(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "🎯 Account found"
        ),
        Ok(false) => debug!(
            site = %outcome.site.name,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "No account"
        ),
        Err(e) if e.is_cancelled() => debug!(site = %outcome.site.name, "Probe cancelled"),
        Err(e) => warn!(site = %outcome.site.name, error = %e, "Probe failed"),
    }
}

/// The blocking shape of [`enumerate`]: drain the stream and return only the
/// positive matches, in completion order.
pub async fn collect_matches(mut stream: ProbeStream) -> Vec<PositiveMatch> {
    let mut matches = Vec::new();
    while let Some(outcome) = stream.next_outcome().await {
        log_outcome(&outcome);
        if let Some(hit) = outcome.to_match() {
            matches.push(hit);
        }
    }
    matches
}

/// A whole run: check the username, load the registry, narrow it to
/// `categories`, probe everything, and hand each match to `on_match` the
/// moment it lands.
///
/// Any error returned from here is fatal and happened before a single probe
/// was sent. Per-site failures only ever show up in the logs and the
/// returned counters.
pub async fn run<F>(
    config: &Config,
    username: &str,
    categories: &[String],
    shutdown: &watch::Receiver<bool>,
    mut on_match: F,
) -> Result<RunSnapshot>
where
    F: FnMut(&PositiveMatch),
{
    validate_username(username)?;

    let registry = registry::load(&config.registry, config.registry_timeout)
        .await?
        .retain_categories(categories);
    if registry.is_empty() {
        return Err(RegistryError::Empty.into());
    }

    let prober = Prober::new(config).map_err(EngineError::Client)?;

    info!(
        user = username,
        sites = registry.len(),
        "📡 Probing every site in the registry"
    );

    let mut stream = enumerate(
        &prober,
        registry.into_sites(),
        username,
        &HuntOptions::from_config(config),
        shutdown,
    )?;

    while let Some(outcome) = stream.next_outcome().await {
        log_outcome(&outcome);
        if let Some(hit) = outcome.to_match() {
            on_match(&hit);
        }
    }

    let snapshot = stream.stats().snapshot();
    info!(
        launched = snapshot.launched,
        matched = snapshot.matched,
        not_found = snapshot.not_found,
        errored = snapshot.errored,
        cancelled = snapshot.cancelled,
        elapsed_ms = snapshot.elapsed_ms,
        "🏁 Run complete"
    );

    Ok(snapshot)
}
