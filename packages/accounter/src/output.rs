//! Rendering: a count, pretty JSON, or CSV.

use std::fs::File;
use std::io::Write;

use anyhow::Context;
use clap::ValueEnum;

use crate::member::{Member, MemberWithDuplicates};

/// The CSV mode always writes to this file in the working directory.
pub const CSV_FILE_NAME: &str = "output.csv";

const CSV_HEADER: [&str; 5] = ["email", "name", "org", "role", "last_sso_auth"];

/// How the final result is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Print the number of report entries
    Count,
    /// Pretty-print the report as JSON
    Json,
    /// Write every normalized member to output.csv
    Csv,
}

/// Emit the configured output for a finished run.
///
/// Count and JSON render the (possibly collapsed) report to stdout. CSV
/// writes the full normalized member set to [`CSV_FILE_NAME`] — the
/// email filter and the dedup collapse do not apply to it.
pub fn render(
    format: OutputFormat,
    report: &[MemberWithDuplicates],
    members: &[Member],
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Count => {
            println!("{}", report.len());
        }
        OutputFormat::Json => {
            let stdout = std::io::stdout();
            write_json(&mut stdout.lock(), report)?;
        }
        OutputFormat::Csv => {
            let file = File::create(CSV_FILE_NAME)
                .with_context(|| format!("failed to create {CSV_FILE_NAME}"))?;
            write_csv(file, members)?;
            tracing::info!(file = CSV_FILE_NAME, rows = members.len(), "wrote CSV output");
        }
    }

    Ok(())
}

/// Write the report as an indented JSON array.
pub fn write_json(out: &mut impl Write, report: &[MemberWithDuplicates]) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(report).context("failed to encode report as JSON")?;
    writeln!(out, "{body}").context("failed to write JSON output")?;
    Ok(())
}

/// Write one CSV row per member, with a header row.
pub fn write_csv(out: impl Write, members: &[Member]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record(CSV_HEADER)
        .context("failed to write CSV header")?;

    for member in members {
        let last_auth = member
            .last_auth
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        writer
            .write_record([
                member.email.as_str(),
                member.name.as_str(),
                member.org.as_str(),
                member.role.as_str(),
                last_auth.as_str(),
            ])
            .context("failed to write CSV row")?;
    }

    writer.flush().context("failed to flush CSV output")?;
    Ok(())
}
