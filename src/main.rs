// src/main.rs
//! Route Guide - record GPS routes and navigate them again with spoken guidance

use anyhow::Context;
use clap::{Parser, Subcommand};
use route_guide::{
    config::GuideConfig,
    display::{ConsoleVoice, TerminalDisplay},
    geo,
    gps::{PositionSource, ReplaySource},
    store::{self, FileStore, RouteStore},
    RouteGuide,
};
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(name = "route-guide", version, about)]
struct Cli {
    /// Directory holding saved routes (overrides the config file)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a route from the configured source until Ctrl+C
    Record {
        /// Route name; a dated default is used when empty
        #[arg(short, long, default_value = "")]
        name: String,
        /// Read fixes from a JSON file instead of a receiver
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Delay between replayed fixes
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// List saved routes
    Routes,
    /// Show one saved route
    Show { id: i64 },
    /// Delete a saved route
    Delete { id: i64 },
    /// Delete every saved route
    Clear,
    /// Export all routes as a JSON array
    Export { file: Option<PathBuf> },
    /// Append routes from a JSON array file
    Import { file: PathBuf },
    /// Navigate a saved route with live guidance
    Navigate {
        id: i64,
        /// Read fixes from a JSON file instead of a receiver
        #[arg(long, conflicts_with = "simulate")]
        replay: Option<PathBuf>,
        /// Drive the route's own points back through as fixes
        #[arg(long)]
        simulate: bool,
        /// Delay between replayed fixes
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Print the active configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = GuideConfig::load().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {}", e);
        GuideConfig::default()
    });

    let storage_dir = match cli.storage {
        Some(dir) => dir,
        None => config.storage_dir()?,
    };
    let mut routes = RouteStore::new(
        FileStore::new(&storage_dir)
            .with_context(|| format!("opening route storage at {}", storage_dir.display()))?,
    );
    let mut display = TerminalDisplay::new();

    match cli.command {
        Command::Record {
            name,
            replay,
            interval_ms,
        } => {
            let source: Box<dyn PositionSource> = match replay {
                Some(path) => Box::new(
                    ReplaySource::from_file(&path, Duration::from_millis(interval_ms))?.restamped(),
                ),
                None => config.position_source()?,
            };

            let (mut guide, mut events) =
                RouteGuide::new(routes, display, ConsoleVoice::new(), config.guidance);
            guide.start_recording(source.as_ref())?;
            println!("Recording from {}. Press Ctrl+C to stop and save.", source.name());

            tokio::select! {
                _ = guide.run_until_idle(&mut events) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
            guide.stop_recording();

            if guide.recording_snapshot().points.is_empty() {
                println!("No fixes recorded, nothing saved.");
                return Ok(());
            }
            let route = guide.save_recording(&name)?;
            println!(
                "Saved route {} '{}': {:.2} km, {} points, {}",
                route.id,
                route.name,
                route.total_distance_km,
                route.points.len(),
                geo::format_duration(route.duration_seconds)
            );
        }
        Command::Routes => {
            display.render_route_list(&routes.list_routes()?)?;
        }
        Command::Show { id } => {
            display.render_route(&routes.get_route(id)?)?;
        }
        Command::Delete { id } => {
            routes.delete_route(id)?;
            println!("Route {} deleted", id);
        }
        Command::Clear => {
            routes.clear_all()?;
            println!("All routes deleted");
        }
        Command::Export { file } => {
            let path = file.unwrap_or_else(|| PathBuf::from(store::default_export_file_name()));
            std::fs::write(&path, routes.export_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Exported routes to {}", path.display());
        }
        Command::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let count = routes
                .import_json(&json)
                .context("import failed, stored routes were left unchanged")?;
            println!("Imported {} route(s)", count);
        }
        Command::Navigate {
            id,
            replay,
            simulate,
            interval_ms,
        } => {
            let interval = Duration::from_millis(interval_ms);
            let source: Box<dyn PositionSource> = match (replay, simulate) {
                (Some(path), _) => Box::new(ReplaySource::from_file(&path, interval)?.restamped()),
                (None, true) => {
                    let route = routes.get_route(id)?;
                    Box::new(ReplaySource::from_route(&route, interval).restamped())
                }
                (None, false) => config.position_source()?,
            };

            let (mut guide, mut events) =
                RouteGuide::new(routes, display, ConsoleVoice::new(), config.guidance);
            guide.start_navigation(id, source.as_ref())?;

            tokio::select! {
                _ = guide.run_until_idle(&mut events) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
            guide.stop_navigation();
        }
        Command::Config => {
            println!("Config file: {}", GuideConfig::get_config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
