// =============================================================================
// models.rs — THE SITES, THE SNAPSHOT, AND THE VERDICTS
// =============================================================================
//
// A Site is one entry from the registry feed: where to knock, and what the
// answer looks like when somebody is home. Sites are read once and never
// touched again, so every probe task can hold one behind an Arc without a
// single lock anywhere.
// =============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProbeError;

/// The token inside `uri_check` that gets replaced with the username.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// One target service, exactly as the registry describes it.
///
/// Missing or `null` fields deserialize to their zero value instead of
/// failing the whole feed. A site with no `e_code` simply never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    /// Display name. Expected to be unique, not enforced.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,

    /// Probe URL with an `{account}` placeholder.
    #[serde(rename = "uri_check", deserialize_with = "null_as_default")]
    pub url_template: String,

    /// Status code of an "account exists" response.
    #[serde(rename = "e_code", deserialize_with = "null_as_default")]
    pub exists_code: u16,

    /// Body fragment of an "account exists" response.
    #[serde(rename = "e_string", deserialize_with = "null_as_default")]
    pub exists_string: String,

    /// Body fragment of an "account missing" response. Parsed, never
    /// consulted by the match decision.
    #[serde(rename = "m_string", deserialize_with = "null_as_default")]
    pub missing_string: String,

    /// Status code of an "account missing" response. Same story.
    #[serde(rename = "m_code", deserialize_with = "null_as_default")]
    pub missing_code: u16,

    /// Usernames known to exist on the site.
    #[serde(deserialize_with = "null_as_default")]
    pub known: Vec<String>,

    #[serde(rename = "cat", deserialize_with = "null_as_default")]
    pub category: String,
}

impl Site {
    /// The probe URL for `user`.
    ///
    /// Every `{account}` is replaced verbatim (no percent-encoding) and the
    /// result is trimmed. A template without the placeholder comes back as
    /// a fixed URL.
    pub fn url_for_user(&self, user: &str) -> String {
        self.url_template
            .replace(ACCOUNT_PLACEHOLDER, user)
            .trim()
            .to_string()
    }

    pub fn has_placeholder(&self) -> bool {
        self.url_template.contains(ACCOUNT_PLACEHOLDER)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The registry feed document. Only `sites` matters to us; everything else
/// in the file (authors, license, categories list) is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct RegistryDocument {
    #[serde(default)]
    pub sites: Vec<Site>,
}

/// The ordered list of sites produced by one registry load. Owned by the
/// caller for one run and never mutated after construction, apart from
/// narrowing it down before the run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    sites: Vec<Site>,
}

impl Registry {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn into_sites(self) -> Vec<Site> {
        self.sites
    }

    /// Keep only the sites whose category matches one of `categories`,
    /// ignoring case. An empty filter keeps everything.
    pub fn retain_categories(self, categories: &[String]) -> Self {
        if categories.is_empty() {
            return self;
        }

        let sites = self
            .sites
            .into_iter()
            .filter(|site| {
                categories
                    .iter()
                    .any(|cat| cat.eq_ignore_ascii_case(&site.category))
            })
            .collect();

        Self { sites }
    }
}

/// The verdict of one probe. Lives just long enough to be looked at by
/// whoever is draining the result stream.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub site: Arc<Site>,

    /// The resolved URL that was (or would have been) requested.
    pub url: String,

    /// `Ok(true)` when the exists signature matched, `Ok(false)` when the
    /// site answered with something else, `Err` when it didn't answer at all.
    pub result: Result<bool, ProbeError>,

    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn exists(&self) -> bool {
        matches!(self.result, Ok(true))
    }

    pub fn error(&self) -> Option<&ProbeError> {
        self.result.as_ref().err()
    }

    /// The positive match carried by this outcome, if it is one.
    pub fn to_match(&self) -> Option<PositiveMatch> {
        if !self.exists() {
            return None;
        }

        Some(PositiveMatch {
            name: self.site.name.clone(),
            url: self.url.clone(),
            category: self.site.category.clone(),
            checked_at: Utc::now(),
        })
    }
}

/// A confirmed account: somebody is home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositiveMatch {
    pub name: String,
    pub url: String,
    pub category: String,
    pub checked_at: DateTime<Utc>,
}

impl fmt::Display for PositiveMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match for '{}': {}", self.name, self.url)
    }
}
