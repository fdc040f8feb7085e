//! voxnav CLI - drive the navigation controller against a simulated world.
//!
//! - `voxnav simulate` - repeated trips showing route caching and invalidation
//! - `voxnav config` - print the effective configuration

mod sim;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use voxnav::{
    CacheDebugInfo, NavConfig, NavOutcome, NavigationController, Planner, Vec3, VoxelPos,
};

use sim::{AStarPlanner, LocalCoordinator, SimWorld, STONE};

const DEFAULT_CONFIG: &str = "voxnav.yaml";

#[derive(Parser)]
#[command(name = "voxnav")]
#[command(about = "Voxel-world navigation simulator", version)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted navigation scenario
    Simulate {
        /// Artificial planning latency per request
        #[arg(long, default_value_t = 600)]
        plan_latency_ms: u64,

        /// Distance to the destination along +z
        #[arg(long, default_value_t = 40)]
        distance: i32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Serialize)]
struct TripReport {
    trip: &'static str,
    effective_target: VoxelPos,
    from_cache: bool,
    cached: bool,
    elapsed_ms: u128,
}

impl TripReport {
    fn new(trip: &'static str, outcome: &NavOutcome) -> Self {
        Self {
            trip,
            effective_target: outcome.effective_target,
            from_cache: outcome.from_cache,
            cached: outcome.cached,
            elapsed_ms: outcome.elapsed.as_millis(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    trips: Vec<TripReport>,
    cache: CacheDebugInfo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            plan_latency_ms,
            distance,
            json,
        } => {
            let report =
                simulate(config, Duration::from_millis(plan_latency_ms), distance).await?;
            print_report(&report, json)
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<NavConfig> {
    match path {
        Some(path) => NavConfig::load(path),
        None => NavConfig::load_or_default(Path::new(DEFAULT_CONFIG)),
    }
}

/// Three trips from the same start: plan and cache, reuse, then replan
/// after a block lands on the cached route.
async fn simulate(
    config: NavConfig,
    latency: Duration,
    distance: i32,
) -> Result<SimulationReport> {
    let start = Vec3::new(0.5, 0.0, 0.5);
    let target = VoxelPos::new(0, 0, distance);

    let world = Arc::new(SimWorld::flat(start));
    world.add_wall(-3, 3, distance / 2);
    world.set_peer("bob", Vec3::new(8.5, 0.0, 0.5));

    let planner = Arc::new(AStarPlanner::new(world.clone(), latency));
    let coordinator = Arc::new(LocalCoordinator::default());
    let nav = NavigationController::builder("alice", world.clone())
        .planner(planner.clone())
        .coordinator(coordinator.clone())
        .config(config)
        .build();

    info!(
        "simulating trips from {} to {} (latency {:?})",
        start.floor(),
        target,
        latency
    );

    let mut trips = Vec::new();

    let first = nav.goto(target).await?;
    trips.push(TripReport::new("plan", &first));

    world.teleport(start);
    let second = nav.goto(target).await?;
    trips.push(TripReport::new("reuse", &second));

    let path = planner
        .last_path()
        .context("planner did not report a path")?;
    let obstacle = path
        .get(path.len() / 4)
        .copied()
        .context("planner reported an empty path")?;
    info!("placing stone at {} on the cached route", obstacle);
    world.set_block(obstacle.offset(0, 1, 0), STONE);
    world.set_block(obstacle, STONE);

    world.teleport(start);
    let third = nav.goto(target).await?;
    trips.push(TripReport::new("replan", &third));

    world.teleport(start);
    let handle = nav.follow_agent("bob", Some(2.0))?;
    tokio::time::sleep(nav.config().follow_tick() * 2).await;
    if let (Some((goal, _)), Some((claim, label))) =
        (planner.background_goal(), coordinator.claim_of(nav.agent()))
    {
        info!("following bob toward {} (claimed {} as {})", goal.pos, claim, label);
    }
    handle.cancel();

    let cache = nav.cache_debug_info();
    nav.dispose();
    Ok(SimulationReport { trips, cache })
}

fn print_report(report: &SimulationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for trip in &report.trips {
        println!(
            "{:<7} -> {}  cache hit: {:<5}  stored: {:<5}  {} ms",
            trip.trip, trip.effective_target, trip.from_cache, trip.cached, trip.elapsed_ms
        );
    }
    println!();
    println!("{}", report.cache.stats.summary());
    for entry in &report.cache.top_entries {
        println!(
            "  {}  uses={} waypoints={} checkpoints={} age={}ms",
            entry.key, entry.use_count, entry.waypoints, entry.checkpoints, entry.age_ms
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "voxnav",
            "--verbose",
            "simulate",
            "--plan-latency-ms",
            "750",
            "--distance",
            "24",
            "--json",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Simulate {
                plan_latency_ms,
                distance,
                json,
            } => {
                assert_eq!(plan_latency_ms, 750);
                assert_eq!(distance, 24);
                assert!(json);
            }
            Commands::Config => panic!("expected simulate"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn simulation_caches_reuses_and_replans() {
        let report = simulate(NavConfig::default(), Duration::from_millis(600), 40)
            .await
            .unwrap();

        let flags: Vec<(bool, bool)> = report
            .trips
            .iter()
            .map(|trip| (trip.from_cache, trip.cached))
            .collect();
        assert_eq!(flags, vec![(false, true), (true, false), (false, true)]);
        assert_eq!(report.cache.stats.saves, 2);
        assert_eq!(report.cache.stats.hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_planning_is_never_cached() {
        let report = simulate(NavConfig::default(), Duration::from_millis(50), 40)
            .await
            .unwrap();

        assert!(report.trips.iter().all(|trip| !trip.cached && !trip.from_cache));
        assert_eq!(report.cache.stats.size, 0);
    }
}
