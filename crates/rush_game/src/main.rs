//! Nexus Rush headless runner.
//!
//! Builds a flight `Session` from config, resolves the craft asset and the
//! anonymous player id, then drives runs either from a replay file or from
//! the built-in autopilot:
//!
//!   1. load + validate config (`--config`, `--seed` override)
//!   2. pick the score sink: local JSON leaderboard or "not configured"
//!   3. `Loading -> Ready` once the craft visual (mesh or placeholder) resolves
//!   4. run the frame loop until the requested runs end or input runs dry
//!   5. settle the last submission and print the leaderboard

mod identity;
mod leaderboard;
mod replay;
mod runner;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use identity::PlayerIdentity;
use leaderboard::{LocalLeaderboard, UnconfiguredSink, DEFAULT_TOP_LIMIT};
use replay::load_replay_from_path;
use runner::{KeySource, RunLimits, Runner};
use rush_sim::{
    load_config_from_path, resolve_craft_visual, validate_config, ScoreSink, Session, SimConfig,
};

const DEFAULT_IDENTITY_PATH: &str = ".nexus_rush/player_id";
const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;
const SHUTDOWN_SETTLE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "rush_game")]
#[command(about = "Headless runner for the Nexus Rush endless-flight simulation")]
struct Cli {
    /// Simulation config JSON; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Replay JSON with per-frame held keys; autopilot when omitted
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Craft mesh descriptor JSON; the placeholder box is used when missing
    #[arg(long)]
    craft_asset: Option<PathBuf>,
    /// Local leaderboard JSON file; scores are not saved when omitted
    #[arg(long)]
    leaderboard: Option<PathBuf>,
    /// Where the anonymous player id is cached
    #[arg(long, default_value = DEFAULT_IDENTITY_PATH)]
    identity: PathBuf,
    /// Per-run time limit in simulated seconds
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Number of runs to play before exiting
    #[arg(long, default_value_t = 1)]
    runs: u32,
    /// Override the config's world seed
    #[arg(long)]
    seed: Option<u64>,
    /// Pace frames against the wall clock instead of stepping a fixed delta
    #[arg(long)]
    realtime: bool,
    /// Leaderboard rows to print at exit
    #[arg(long, default_value_t = 10)]
    top: usize,
}

fn load_config(cli: &Cli) -> Result<SimConfig, String> {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    validate_config(&config)?;
    Ok(config)
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(&cli)?;
    log::info!("World seed {:#x}", config.seed);

    let identity = PlayerIdentity::load_or_create(&cli.identity);

    let max_score = config.scoring.max_score.max(0.0) as u32;
    let leaderboard = match &cli.leaderboard {
        Some(path) => Some(Arc::new(LocalLeaderboard::open(path, max_score)?)),
        None => {
            log::warn!("No leaderboard configured; scores will not be saved");
            None
        }
    };
    let sink: Arc<dyn ScoreSink> = match &leaderboard {
        Some(board) => board.clone(),
        None => Arc::new(UnconfiguredSink),
    };

    let (keys, fixed_dt) = match &cli.replay {
        Some(path) => {
            let replay = load_replay_from_path(path)?;
            log::info!(
                "Replay {} loaded: {} frames at {:.4}s",
                path.display(),
                replay.expanded_keys().len(),
                replay.fixed_dt
            );
            (KeySource::replay(replay.expanded_keys()), replay.fixed_dt)
        }
        None => (KeySource::Autopilot, DEFAULT_FIXED_DT),
    };

    let mut session = Session::new(config, identity.anon_id, sink);
    session.craft_ready(resolve_craft_visual(cli.craft_asset.as_deref()));

    let mut runner = Runner::new(session, keys);
    let summaries = runner.run(&RunLimits {
        runs: cli.runs.max(1),
        seconds_per_run: cli.seconds,
        fixed_dt,
        realtime: cli.realtime,
    });

    for (index, summary) in summaries.iter().enumerate() {
        println!(
            "run {}: score {} rings {} time {:.1}s [{}]",
            index + 1,
            summary.final_score,
            summary.collected_rings,
            summary.seconds,
            summary.status
        );
    }

    let status = runner.into_session().teardown(SHUTDOWN_SETTLE);
    log::info!("Final submit status: {status}");

    if let Some(board) = leaderboard {
        let limit = if cli.top == 0 { DEFAULT_TOP_LIMIT } else { cli.top };
        for (rank, row) in board.top(limit).iter().enumerate() {
            println!("{:>3}. {:>6}  {}", rank + 1, row.score, row.anon_id);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Nexus Rush starting...");

    if let Err(err) = run(Cli::parse()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
