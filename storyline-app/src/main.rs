use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use storyline_app::{Harvester, build_from_config, write_stories};
use storyline_common::observability::init_logging;
use storyline_config::{StorylineConfig, StorylineConfigLoader};
use tokio::net::TcpListener;

const DEFAULT_CONFIG_FILE: &str = "storyline.yaml";

#[derive(Debug, Parser)]
#[command(name = "storyline", version, about = "Pull the latest headlines off a news home page")]
struct Cli {
    /// YAML config file (defaults to ./storyline.yaml when present)
    #[arg(short, long, global = true, env = "STORYLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download the home page into the page cache
    Fetch,
    /// Extract stories and print them as JSON
    Extract {
        /// Download a fresh copy first instead of reading the cache
        #[arg(long)]
        fetch: bool,
        /// Maximum number of stories
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Where to save the stories (overrides cache.stories_file)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Serve GET /getTimeStories
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => StorylineConfigLoader::new().with_file(path),
        None => StorylineConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    let cfg: StorylineConfig = loader.load().context("loading configuration")?;

    init_logging(cfg.logging.to_log_config("storyline"))?;
    let harvester = build_from_config(&cfg)?;

    match cli.command {
        Command::Fetch => {
            harvester.refresh_page().await?;
            println!("{}", harvester.cache().page_file().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Extract { fetch, limit, out } => {
            let limit = limit.unwrap_or(harvester.limit());
            if limit == 0 {
                bail!("--limit must be at least 1");
            }
            let out = out.unwrap_or_else(|| cfg.cache.stories_file.clone());
            extract(&harvester, fetch, limit, out).await
        }
        Command::Serve { bind } => {
            let addr = match bind {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("invalid --bind {raw:?}"))?,
                None => cfg.server.addr()?,
            };
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            storyline_app::serve(listener, Arc::new(harvester)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn extract(harvester: &Harvester, fetch: bool, limit: usize, out: PathBuf) -> Result<ExitCode> {
    let harvest = harvester.harvest_with_limit(fetch, limit).await?;
    write_stories(&out, &harvest.stories).await?;
    println!("{}", serde_json::to_string_pretty(&harvest.stories)?);

    if harvest.is_insufficient() {
        eprintln!(
            "only {} of {} stories extracted",
            harvest.extracted(),
            harvest.requested
        );
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_extract_flags() {
        let cli = Cli::try_parse_from(["storyline", "extract", "--fetch", "-n", "3", "-o", "out.json"])
            .unwrap();
        match cli.command {
            Command::Extract { fetch, limit, out } => {
                assert!(fetch);
                assert_eq!(limit, Some(3));
                assert_eq!(out, Some(PathBuf::from("out.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["storyline", "serve", "--config", "x.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
    }
}
