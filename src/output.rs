// =============================================================================
// output.rs — TELLING THE HUMAN
// =============================================================================
//
// Matches go to stdout, one per line, nothing else. Logs go to stderr. That
// way `wmn --user bob | wc -l` counts accounts and not log lines.
// =============================================================================

use std::io::Write;

use crate::models::PositiveMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `match for '<name>': <url>`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Render one match as a single line, without the newline.
pub fn render(hit: &PositiveMatch, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(hit.to_string()),
        OutputFormat::Json => serde_json::to_string(hit),
    }
}

/// Write one match line to `out` and flush, so matches show up as they land.
pub fn write_match<W: Write>(
    out: &mut W,
    hit: &PositiveMatch,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let line = render(hit, format)?;
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}
