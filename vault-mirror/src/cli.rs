///
/// This module implements the full CLI interface for vault-mirror — handling
/// command parsing, argument validation, main entrypoints, and user-visible
/// invocations.
///
/// All core business logic (reconciliation, pipeline, publishing) lives in the
/// [`vault-mirror-core`] crate. This module is strictly for CLI glue,
/// ergonomic argument exposure, and orchestration.
///
/// ## Features
/// - Entry struct [`Cli`] defines all user-facing options and subcommands.
/// - Subcommand routing (`sync`, `serve`) and argument validation.
/// - Async entrypoint (`run`) for programmatic invocation and integration
///   testing.
///
/// ## How To Use
/// - For command-line users: use the installed `vault-mirror` binary with
///   `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed
///   [`Cli`].
///
/// [`vault-mirror-core`]: ../../vault-mirror-core/
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vault_mirror_core::publish::Publisher;
use vault_mirror_core::store::MemoryStore;
use vault_mirror_core::synchronise::synchronise;

use crate::github::GitHubClient;
use crate::load_config::{load_config, CliConfig};
use crate::server::{self, AppState};

/// CLI for vault-mirror: mirror a markdown vault into a queryable cache.
#[derive(Parser)]
#[clap(
    name = "vault-mirror",
    version,
    about = "Mirror markdown articles and attachments from a Git-hosted vault into a local cache and serve them"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one synchronisation pass against the remote repository and report
    /// what changed. With the in-memory store this doubles as a dry run.
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Synchronise, then serve the read API over the populated cache
    Serve {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Skip the synchronisation pass at startup and serve an empty cache
        #[clap(long)]
        skip_initial_sync: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "sync", "Starting synchronisation run");
            let (remote, sync_config) = build_remote(&config)?;
            let store = MemoryStore::new();
            let publisher = Publisher::new();
            match synchronise(&sync_config, &remote, &store, &publisher).await {
                Ok(report) => {
                    tracing::info!(command = "sync", ?report, "Synchronisation complete");
                    println!(
                        "articles: {} total, {} fetched, {} unchanged, {} deleted, {} failed",
                        report.articles.total,
                        report.articles.fetched,
                        report.articles.unchanged,
                        report.articles.deleted,
                        report.articles.failed
                    );
                    println!(
                        "images:   {} total, {} fetched, {} unchanged, {} deleted, {} failed",
                        report.images.total,
                        report.images.fetched,
                        report.images.unchanged,
                        report.images.deleted,
                        report.images.failed
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Serve {
            config,
            skip_initial_sync,
        } => {
            let config = load_config(config)?;
            let (remote, sync_config) = build_remote(&config)?;
            let store = Arc::new(MemoryStore::new());
            let publisher = Publisher::new();

            if skip_initial_sync {
                tracing::warn!(command = "serve", "Skipping initial sync, cache starts empty");
            } else {
                tracing::info!(command = "serve", "Running initial synchronisation");
                let report = synchronise(&sync_config, &remote, store.as_ref(), &publisher)
                    .await
                    .map_err(anyhow::Error::new)?;
                tracing::info!(command = "serve", ?report, "Initial synchronisation complete");
            }

            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid server address: {e}"))?;
            let state = AppState {
                store,
                processor: sync_config.processor,
            };
            server::serve(addr, state).await
        }
    }
}

fn build_remote(config: &CliConfig) -> Result<(GitHubClient, vault_mirror_core::config::SyncConfig)> {
    let sync_config = config.sync_config();
    sync_config.trace_loaded();
    let remote = GitHubClient::new(
        config.remote.owner.clone(),
        config.remote.repo.clone(),
        config.remote.reference.clone(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to construct GitHub client: {e}"))?;
    Ok((remote, sync_config))
}
