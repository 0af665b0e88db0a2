//! Kingdom Simulation Runner
//!
//! Plays scripted games headlessly, one or many seeds in parallel, and logs
//! how each kingdom fared.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use kingdom::catalog::{BuildingKind, FlagKind};
use kingdom::{BuildingId, ConfigError, GameOverReason, Position, SimConfig, Simulation, Statistics};

/// Headless kingdom simulation runner
#[derive(Parser, Debug)]
#[command(name = "kingdom-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum ticks per game
    #[arg(short, long, default_value = "500")]
    ticks: u64,

    /// First seed; further runs use the following seeds
    #[arg(short, long, default_value = "1")]
    seed: u64,

    /// Number of games to play in parallel
    #[arg(short, long, default_value = "1")]
    runs: u64,

    /// JSON file overriding the default tuning
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save the first game's final state (.json for JSON, anything else bincode)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log every game event
    #[arg(short, long)]
    verbose: bool,
}

/// How one scripted game ended.
#[derive(Debug)]
struct RunOutcome {
    seed: u64,
    ticks: u64,
    game_over: Option<GameOverReason>,
    heroes: usize,
    gold: u32,
    statistics: Statistics,
}

/// Castle-adjacent opening: two guilds, an inn and a market, then the first
/// recruits and an explore flag.
fn opening(sim: &mut Simulation) -> Vec<BuildingId> {
    let center = sim.grid().center();
    let mut guilds = Vec::new();
    let plan = [
        (BuildingKind::WarriorGuild, center.offset(-2, 0)),
        (BuildingKind::RangerGuild, center.offset(2, 0)),
        (BuildingKind::Inn, center.offset(0, 2)),
        (BuildingKind::Marketplace, center.offset(0, -2)),
    ];
    for (kind, at) in plan {
        match sim.place_building(kind, at) {
            Ok(id) if kind.guild_class().is_some() => guilds.push(id),
            Ok(_) => {}
            Err(e) => warn!(%kind, %at, "opening placement failed: {e}"),
        }
    }
    for &guild in &guilds {
        if let Err(e) = sim.spawn_hero_from_guild(guild) {
            warn!(%guild, "opening recruit failed: {e}");
        }
    }
    if let Err(e) = sim.place_flag(FlagKind::Explore, center.offset(5, 4)) {
        debug!("explore flag skipped: {e}");
    }
    guilds
}

fn play(config: SimConfig, seed: u64, max_ticks: u64) -> Result<(Simulation, RunOutcome), ConfigError> {
    let mut sim = Simulation::with_seed(config, seed)?;
    let guilds = opening(&mut sim);

    while sim.tick() < max_ticks && !sim.is_game_over() {
        let report = sim.advance_tick();
        for event in sim.drain_events() {
            debug!(seed, tick = event.tick, "{}", event.event);
        }

        // Re-staff a guild whenever its doorstep is free and the treasury allows.
        if report.tick % 10 == 0 {
            for &guild in &guilds {
                if sim.resources().gold >= 100 {
                    let _ = sim.spawn_hero_from_guild(guild);
                }
            }
        }
    }

    let outcome = RunOutcome {
        seed,
        ticks: sim.tick(),
        game_over: sim.game_over_reason(),
        heroes: sim.heroes().len(),
        gold: sim.resources().gold,
        statistics: sim.statistics().clone(),
    };
    Ok((sim, outcome))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };

    info!(runs = args.runs, ticks = args.ticks, first_seed = args.seed, "Kingdom simulation starting...");
    let start = Instant::now();

    let mut results: Vec<(Simulation, RunOutcome)> = (args.seed..args.seed + args.runs.max(1))
        .into_par_iter()
        .map(|seed| play(config.clone(), seed, args.ticks))
        .collect::<Result<_, _>>()?;
    results.sort_by_key(|(_, outcome)| outcome.seed);

    for (_, outcome) in &results {
        let ending = outcome
            .game_over
            .map_or_else(|| "kingdom stands".to_string(), |reason| reason.to_string());
        info!(
            seed = outcome.seed,
            ticks = outcome.ticks,
            heroes = outcome.heroes,
            gold = outcome.gold,
            defeated = outcome.statistics.enemies_defeated,
            lost = outcome.statistics.heroes_lost,
            highest_level = outcome.statistics.highest_hero_level,
            "{ending}"
        );
    }

    let survived = results.iter().filter(|(_, o)| o.game_over.is_none()).count();
    info!(
        "Completed {} game(s) in {:?}: {} survived",
        results.len(),
        start.elapsed(),
        survived
    );

    if let Some(usage) = memory_stats::memory_stats() {
        info!(
            physical_mb = usage.physical_mem / (1024 * 1024),
            virtual_mb = usage.virtual_mem / (1024 * 1024),
            "memory usage"
        );
    }

    if let (Some(path), Some((sim, _))) = (&args.save, results.first()) {
        let bytes = sim
            .save_to_file(path)
            .with_context(|| format!("saving {}", path.display()))?;
        info!(path = %path.display(), bytes, "saved first game");
    }

    Ok(())
}
