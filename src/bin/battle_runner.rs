//! Headless Battle Runner
//!
//! Runs uncoached battles between two roster teams over a range of seeds and
//! prints one JSON summary per battle. Battles share nothing, so they run in
//! parallel.

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use rogue_arena::battle::{load_roster, BattleSession, BattleSetup, EndReason};
use rogue_arena::core::config::{load_config, EngineConfig};
use rogue_arena::core::types::{BattleId, TeamSide};
use rogue_arena::rewards::{RewardCalculator, RewardContext};

/// Headless Battle Runner - seeded uncoached battles
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run seeded battles between two roster teams and print JSON summaries")]
struct Args {
    /// Home team name from the roster
    #[arg(long)]
    home: Option<String>,

    /// Away team name from the roster
    #[arg(long)]
    away: Option<String>,

    /// First seed of the range
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of battles (seeds seed..seed+count)
    #[arg(long, default_value_t = 1)]
    count: u64,

    /// Engine tuning file
    #[arg(long, default_value = "data/engine.toml")]
    config: String,

    /// Roster file
    #[arg(long, default_value = "data/roster.toml")]
    roster: String,

    /// Also print an aggregate line after the per-battle summaries
    #[arg(long)]
    summary: bool,
}

/// JSON output for one battle
#[derive(Serialize)]
struct BattleSummary {
    seed: u64,
    home: String,
    away: String,
    winner: Option<String>,
    reason: EndReason,
    rounds: u32,
    rogue_actions: u32,
    home_damage: f64,
    away_damage: f64,
    home_xp: u32,
    away_xp: u32,
}

/// JSON output across all battles
#[derive(Serialize)]
struct Aggregate {
    battles: usize,
    home_wins: usize,
    away_wins: usize,
    draws: usize,
    average_rounds: f64,
    rogue_rate: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %args.config, error = %e, "Falling back to built-in tuning");
            EngineConfig::default()
        }
    };
    let config = Arc::new(config);

    let roster = match load_roster(&args.roster) {
        Ok(roster) => roster,
        Err(e) => {
            eprintln!("Failed to load roster {}: {}", args.roster, e);
            std::process::exit(1);
        }
    };
    let names = roster.team_names();
    let home = args.home.clone().unwrap_or_else(|| names[0].to_string());
    let away = args.away.clone().unwrap_or_else(|| names[1].to_string());

    let summaries: Vec<BattleSummary> = (args.seed..args.seed.saturating_add(args.count))
        .into_par_iter()
        .filter_map(|seed| match roster.setup(&home, &away, seed) {
            Ok(setup) => Some(run_battle(setup, Arc::clone(&config))),
            Err(e) => {
                tracing::warn!(seed, error = %e, "Skipping battle");
                None
            }
        })
        .collect();

    for summary in &summaries {
        match serde_json::to_string(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(seed = summary.seed, error = %e, "Failed to serialize summary"),
        }
    }

    if args.summary {
        if let Ok(json) = serde_json::to_string(&aggregate(&summaries, &home, &away)) {
            println!("{}", json);
        }
    }
}

fn run_battle(setup: BattleSetup, config: Arc<EngineConfig>) -> BattleSummary {
    let seed = setup.seed;
    let home = setup.home.name.clone();
    let away = setup.away.name.clone();
    let mut session = BattleSession::new(BattleId::new(), setup, config);

    if let Err(e) = session.play_out() {
        tracing::warn!(seed, error = %e, "Battle aborted");
    }

    let rogue_actions = session.log().records().iter().filter(|r| r.is_rogue()).count() as u32;
    let mut summary = BattleSummary {
        seed,
        home: home.clone(),
        away: away.clone(),
        winner: None,
        reason: EndReason::RoundCap,
        rounds: session.round(),
        rogue_actions,
        home_damage: 0.0,
        away_damage: 0.0,
        home_xp: 0,
        away_xp: 0,
    };

    let Some(report) = session.report() else {
        return summary;
    };
    summary.reason = report.reason;
    summary.winner = report.outcome.winner().map(|side| match side {
        TeamSide::Home => home.clone(),
        TeamSide::Away => away.clone(),
    });

    let calculator = RewardCalculator::new();
    let mut dice = ChaCha8Rng::seed_from_u64(seed);
    for (side, perf) in TeamSide::both().into_iter().zip(&report.performances) {
        let opponent_level = session.fighter(side.opponent()).level;
        let rewards = calculator.calculate(
            perf,
            RewardContext {
                opponent_level,
                round_cap: session.config().battle.round_cap,
                ..Default::default()
            },
            &mut dice,
        );
        match side {
            TeamSide::Home => {
                summary.home_damage = perf.damage_dealt;
                summary.home_xp = rewards.xp_gained;
            }
            TeamSide::Away => {
                summary.away_damage = perf.damage_dealt;
                summary.away_xp = rewards.xp_gained;
            }
        }
    }
    summary
}

fn aggregate(summaries: &[BattleSummary], home: &str, away: &str) -> Aggregate {
    let battles = summaries.len();
    let count = |name: &str| summaries.iter().filter(|s| s.winner.as_deref() == Some(name)).count();
    let home_wins = count(home);
    let away_wins = count(away);
    let total_rounds: u32 = summaries.iter().map(|s| s.rounds).sum();
    let total_rogue: u32 = summaries.iter().map(|s| s.rogue_actions).sum();
    let denom = battles.max(1) as f64;

    Aggregate {
        battles,
        home_wins,
        away_wins,
        draws: battles.saturating_sub(home_wins + away_wins),
        average_rounds: total_rounds as f64 / denom,
        // two actions per round at most
        rogue_rate: total_rogue as f64 / (total_rounds.max(1) as f64 * 2.0),
    }
}
