//! treesync CLI
//!
//! Usage: treesync <COMMAND>
//!
//! Commands:
//!   sync   Synchronize a source tree onto a destination
//!   check  Validate the configuration and show the selected backend

mod cli;
mod logging;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use treesync::config::{discover, EndpointConfig};
use treesync::{
    select_backend, CancelToken, Config, FilterChain, PathFilter, SyncDirection, SyncEngine,
    SyncError,
};

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        if let Some(SyncError::DelegatedTool { stderr, .. }) = err.downcast_ref::<SyncError>() {
            if !stderr.trim().is_empty() {
                eprintln!("{}", stderr.trim_end());
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync {
            config,
            source,
            destination,
            reverse,
            force,
            delete,
            dry_run,
            include,
            exclude,
            mode,
            paths,
        } => {
            let mut loaded = load_config(config.as_deref())?;
            if let Some(uri) = source {
                loaded.source = Some(EndpointConfig::new(uri));
            }
            if let Some(uri) = destination {
                loaded.destination = Some(EndpointConfig::new(uri));
            }
            if let Some(mode) = mode {
                loaded.sync.mode = mode.into();
            }
            loaded.sync.delete |= delete;
            if reverse {
                loaded.sync.direction = SyncDirection::ToSource;
            }

            let configuration = loaded.to_sync_configuration()?;
            let extra = PathFilter::validated(include, exclude)
                .map_err(|e| SyncError::configuration(format!("invalid filter prefix: {}", e)))?;

            let cancel = CancelToken::new();
            let handle = cancel.clone();
            ctrlc::set_handler(move || handle.cancel())
                .context("failed to install Ctrl+C handler")?;

            let report = SyncEngine::new()
                .with_cancel(cancel)
                .with_dry_run(dry_run)
                .sync(
                    &configuration,
                    loaded.sync.direction,
                    &paths,
                    force || loaded.sync.force,
                    &FilterChain::from(extra),
                )?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for path in &report.deleted {
                    println!("deleted  {}", path);
                }
                for path in &report.created_dirs {
                    println!("mkdir    {}/", path);
                }
                for path in &report.copied {
                    println!("copied   {}", path);
                }
                println!("{}", report.summary());
            }
            Ok(())
        }

        Commands::Check { config } => {
            let loaded = load_config(config.as_deref())?;
            let configuration = loaded.to_sync_configuration()?;
            let backend = select_backend(&configuration)?;

            if cli.json {
                let value = serde_json::json!({
                    "source": configuration.source.to_string(),
                    "destination": configuration.destination.to_string(),
                    "direction": loaded.sync.direction,
                    "mode": configuration.mode,
                    "backend": backend.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("source:      {}", configuration.source);
                println!("destination: {}", configuration.destination);
                println!("direction:   {}", loaded.sync.direction);
                println!("mode:        {}", configuration.mode.as_str());
                println!("backend:     {}", backend);
            }
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match discover(explicit)? {
        Some(path) => {
            let (config, warnings) = Config::load_with_warnings(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            for warning in warnings {
                let location = warning
                    .line
                    .map(|line| format!("{}:{}", warning.file.display(), line))
                    .unwrap_or_else(|| warning.file.display().to_string());
                match warning.suggestion {
                    Some(suggestion) => warn!(
                        "unknown config key '{}' at {} (did you mean '{}'?)",
                        warning.key, location, suggestion
                    ),
                    None => warn!("unknown config key '{}' at {}", warning.key, location),
                }
            }
            config
        }
        None => Config::default(),
    };
    Ok(config.with_env_overrides())
}
