//! Buildkite account reporting CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use accounter::member::Member;
use accounter::output::{self, OutputFormat};
use accounter::report;
use accounter::source::{ApiSource, DiskCacheSource, MemberSource};
use buildkite_client::BuildkiteClient;

#[derive(Parser)]
#[command(name = "accounter")]
#[command(about = "Report on user accounts across Buildkite organizations")]
#[command(version)]
struct Cli {
    /// Print debugging detail, including full API requests and responses
    #[arg(long)]
    debug: bool,

    /// A Buildkite GraphQL API token
    #[arg(long, env = "BUILDKITE_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Organization slugs to report on
    #[arg(long = "org-slug")]
    org_slugs: Vec<String>,

    /// Cache fetched members on disk
    #[arg(long)]
    cache: bool,

    /// Directory for cached member files
    #[arg(long, default_value = "./.cache")]
    cache_dir: PathBuf,

    /// Collapse later duplicate accounts sharing these keys
    #[arg(long, value_enum)]
    dedupe: Vec<DedupeKey>,

    /// How to output rows
    #[arg(long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Only report on a single email
    #[arg(long)]
    email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DedupeKey {
    Email,
    Name,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.debug);
    let debug = cli.debug;

    if let Err(e) = run(cli).await {
        if debug {
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("Error: {e:#}");
        }
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    let client = BuildkiteClient::new(cli.api_token.clone());

    let source: Box<dyn MemberSource> = if cli.cache {
        std::fs::create_dir_all(&cli.cache_dir).with_context(|| {
            format!("failed to create cache directory {}", cli.cache_dir.display())
        })?;
        Box::new(DiskCacheSource::new(
            ApiSource::new(client),
            cli.cache_dir.clone(),
        ))
    } else {
        Box::new(ApiSource::new(client))
    };

    let members = fetch_members(source.as_ref(), &cli.org_slugs).await?;

    tracing::debug!(
        accounts = members.len(),
        orgs = cli.org_slugs.len(),
        "normalized accounts"
    );

    let report = report::build_report(&members, cli.email.as_deref());

    let by_email = cli.dedupe.contains(&DedupeKey::Email);
    let by_name = cli.dedupe.contains(&DedupeKey::Name);
    let report = report::collapse(report, by_email, by_name);

    output::render(cli.output, &report, &members)
}

/// Fetch and normalize the members of every requested org, in order.
/// The first failure of any kind aborts the run.
async fn fetch_members(source: &dyn MemberSource, org_slugs: &[String]) -> Result<Vec<Member>> {
    let mut members = Vec::new();

    for org_slug in org_slugs {
        tracing::debug!(org = %org_slug, "finding members");
        let started = Instant::now();

        let raw = source
            .org_members(org_slug)
            .await
            .with_context(|| format!("failed to fetch members of {org_slug}"))?;

        for org_member in &raw {
            members.push(Member::from_org_member(org_member, org_slug)?);
        }

        tracing::debug!(
            org = %org_slug,
            count = raw.len(),
            elapsed = ?started.elapsed(),
            "fetched members"
        );
    }

    Ok(members)
}
