mod pipeline;

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tvrank_core::{AppConfig, ConfigError, SourceGroup};
use tvrank_scraper::HttpClient;

#[derive(Debug, Parser)]
#[command(name = "tvrank")]
#[command(about = "Scrape online viewership tables, rank them and publish the results")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape, rank and publish every configured group (the default)
    Run {
        /// Only run the group with this name
        #[arg(long)]
        group: Option<String>,
        /// Scrape and rank, but print a summary instead of publishing
        #[arg(long)]
        dry_run: bool,
    },
    /// List configured groups and their sources
    Groups,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = tvrank_core::load_app_config();
    let log_level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Err(e) = dispatch(cli, config).await {
        tracing::error!(error = %format!("{e:#}"), "tvrank failed");
        return Err(e);
    }
    Ok(())
}

/// Only `run` needs a valid configuration; `groups` reads the sources file
/// alone, so it works without publisher credentials.
async fn dispatch(cli: Cli, config: Result<AppConfig, ConfigError>) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Run {
        group: None,
        dry_run: false,
    }) {
        Commands::Run { group, dry_run } => {
            let config = config?;
            let groups = load_groups(&config.sources_path)?;
            run(&config, groups, group.as_deref(), dry_run).await
        }
        Commands::Groups => {
            print!("{}", groups_listing(&tvrank_core::load_sources_path())?);
            Ok(())
        }
    }
}

fn load_groups(path: &Path) -> anyhow::Result<Vec<SourceGroup>> {
    tvrank_core::load_sources(path).map_err(|e| {
        anyhow::anyhow!("failed to load source groups from {}: {e}", path.display())
    })
}

async fn run(
    config: &AppConfig,
    groups: Vec<SourceGroup>,
    group_filter: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let groups = pipeline::select_groups(groups, group_filter)?;

    let transport = Arc::new(
        HttpClient::from_config(&config.http)
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?,
    );
    let publisher = tvrank_publish::build_publisher(&config.publisher, Arc::clone(&transport));
    let run_date = chrono::Local::now().date_naive();

    tracing::info!(
        groups = groups.len(),
        publisher = config.publisher.kind(),
        %run_date,
        dry_run,
        "starting run"
    );

    let reports =
        pipeline::run_all(transport.as_ref(), publisher.as_ref(), &groups, run_date, dry_run).await;
    for report in &reports {
        println!("{report}");
    }
    pipeline::ensure_any_succeeded(&reports, dry_run)
}

/// One line per group followed by one indented line per source.
fn groups_listing(path: &Path) -> anyhow::Result<String> {
    let mut out = String::new();
    for group in load_groups(path)? {
        out.push_str(&format!(
            "{} ({}, prefix {}):\n",
            group.name, group.variant, group.artifact_prefix
        ));
        for source in &group.sources {
            out.push_str(&format!("  {}: {}\n", source.service, source.endpoint));
        }
    }
    Ok(out)
}
