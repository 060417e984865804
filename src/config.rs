// =============================================================================
// config.rs — THE KNOB PANEL
// =============================================================================
//
// Five knobs. That's it. We had more, then we remembered this thing sends
// GET requests and greps the response.
//
// All values can be overridden via environment variables prefixed with WMN_,
// and the CLI can override most of them again for a single run.
// =============================================================================

use std::env;
use std::time::Duration;

/// The public WhatsMyName registry. Several hundred sites, one JSON file.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/WebBreacher/WhatsMyName/refs/heads/main/wmn-data.json";

/// Default per-probe timeout. Some sites are slow. Some sites are very slow.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(45);

/// Default bound on fetching the registry itself.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(30);

/// A lot of sites serve a different page to anything that doesn't look
/// like a browser, and the match signatures in the registry were captured
/// with a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the site registry lives. Either an http(s) URL or a path to a
    /// local JSON file with the same schema.
    pub registry: String,

    /// Upper bound on a single probe, request plus body read.
    pub probe_timeout: Duration,

    /// Upper bound on fetching the registry.
    pub registry_timeout: Duration,

    /// Maximum number of probes in flight at once. `None` means one per site,
    /// all at once, which is how the registry was meant to be hammered.
    pub max_concurrency: Option<usize>,

    /// User-Agent sent with every probe.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY_URL.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
            max_concurrency: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// Garbage in a numeric variable falls back to the default instead of
    /// killing the run. A `.env` file is picked up if one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        Config {
            registry: env_or_default("WMN_REGISTRY", DEFAULT_REGISTRY_URL),
            probe_timeout: Duration::from_secs(
                env_or_default("WMN_PROBE_TIMEOUT_SECS", "45")
                    .parse()
                    .unwrap_or(defaults.probe_timeout.as_secs()),
            ),
            registry_timeout: Duration::from_secs(
                env_or_default("WMN_REGISTRY_TIMEOUT_SECS", "30")
                    .parse()
                    .unwrap_or(defaults.registry_timeout.as_secs()),
            ),
            max_concurrency: concurrency_limit(
                env_or_default("WMN_MAX_CONCURRENCY", "0").parse().unwrap_or(0),
            ),
            user_agent: env_or_default("WMN_USER_AGENT", DEFAULT_USER_AGENT),
        }
    }
}

/// Zero means "no cap".
pub fn concurrency_limit(raw: usize) -> Option<usize> {
    if raw == 0 {
        None
    } else {
        Some(raw)
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
