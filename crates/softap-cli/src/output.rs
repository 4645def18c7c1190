//! Output formatting: plain or JSON.
//!
//! Trimmed from the multi-format (`table`/`json`/`yaml`/`plain`) renderer
//! this CLI is descended from — there are no list views here, just a single
//! configuration or lifecycle snapshot per invocation, so `tabled`/
//! `serde_yaml` earn no keep.

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a single serde-serializable item in the chosen format.
///
/// `plain` uses a caller-supplied detail string; `json` serializes via serde.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Plain => Ok(detail_fn(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    println!("{output}");
}
