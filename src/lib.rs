// =============================================================================
// WMN ENGINE
// =============================================================================
//
// Ask several hundred websites, all at once, whether they know a username.
// The registry says where to knock and what "yes" looks like; we do the
// knocking.
//
//   registry ──► [Site, Site, Site, ...] ──► one task per Site ──► matches
//
// Every task is independent. One site hanging, refusing, or serving garbage
// TLS never slows down or breaks the others.
// =============================================================================

pub mod config;
pub mod error;
pub mod hunt;
pub mod matcher;
pub mod models;
pub mod output;
pub mod probe;
pub mod registry;
pub mod stats;

pub use config::Config;
pub use error::{EngineError, ProbeError, RegistryError};
pub use hunt::{collect_matches, enumerate, run, HuntOptions, ProbeStream};
pub use matcher::is_match;
pub use models::{PositiveMatch, ProbeOutcome, Registry, Site};
pub use probe::Prober;
pub use stats::{RunSnapshot, RunStats};
