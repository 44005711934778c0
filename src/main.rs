//! Rogue Arena - Coach Console
//!
//! Coach the first roster team against the second from the terminal. The
//! opponent never picks a strategy, so its slots are always auto-filled.
//! Dialogue comes from an LLM when LLM_API_KEY is set and from the local
//! fallback pool otherwise.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

use rogue_arena::battle::{
    load_roster, BattleEvent, BattleInput, BattlePhase, BattleSession, StrategySelection,
};
use rogue_arena::core::config::{load_config, EngineConfig};
use rogue_arena::core::error::Result;
use rogue_arena::core::types::{BattleId, TeamSide};
use rogue_arena::narrative::{LlmClient, Narrator};
use rogue_arena::psych::{CoachingEffectProcessor, CoachingFocus, CoachingIntensity, CoachingRequest};
use rogue_arena::rewards::{RewardCalculator, RewardContext, SkillProgressionEngine, SkillSet};

const CONFIG_PATH: &str = "data/engine.toml";
const ROSTER_PATH: &str = "data/roster.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rogue_arena=info")),
        )
        .init();

    let config = if Path::new(CONFIG_PATH).exists() {
        load_config(CONFIG_PATH)?
    } else {
        tracing::warn!("{} not found - using built-in tuning", CONFIG_PATH);
        EngineConfig::default()
    };
    let config = Arc::new(config);
    let roster = load_roster(ROSTER_PATH)?;

    let rt = Runtime::new()?;
    let llm_client = LlmClient::from_env().ok();
    if llm_client.is_none() {
        tracing::warn!("LLM_API_KEY not set - dialogue uses the fallback pool");
    }
    let narrator = Narrator::from_config(llm_client, &config.timers);

    let names = roster.team_names();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let home = args.first().map(String::as_str).unwrap_or(names[0]);
    let away = args.get(1).map(String::as_str).unwrap_or(names[1]);
    let seed = args.get(2).and_then(|s| s.parse().ok()).unwrap_or_else(rand::random);
    let setup = roster.setup(home, away, seed)?;

    let mut session = BattleSession::new(BattleId::new(), setup, Arc::clone(&config));

    println!("\n=== ROGUE ARENA ===");
    println!(
        "{} ({}) vs {} ({}) - seed {}",
        session.side(TeamSide::Home).name,
        session.fighter(TeamSide::Home).name,
        session.side(TeamSide::Away).name,
        session.fighter(TeamSide::Away).name,
        seed
    );
    println!();
    println!("Commands:");
    println!("  start                      - Enter the pre-battle huddle");
    println!("  coach <focus> <intensity>  - Coach your fighter (huddle or selection)");
    println!("  ready                      - Close the huddle");
    println!("  pick <slot> <ability>      - Choose attack/defense/special");
    println!("  go                         - Lock strategy and fight the round");
    println!("  auto                       - Play the rest of the battle");
    println!("  status / s                 - Show battle state");
    println!("  quit / q                   - Exit");
    println!();

    loop {
        print!("[{:?} r{}] > ", session.phase(), session.round());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "q" {
            break;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let result = match parts.as_slice() {
            ["status"] | ["s"] => {
                display_status(&session);
                continue;
            }
            ["start"] => session.advance(BattleInput::StartBattle),
            ["ready"] => session.advance(BattleInput::EndHuddle),
            ["coach", focus, intensity] => match (parse_focus(focus), parse_intensity(intensity)) {
                (Some(focus), Some(intensity)) => {
                    let request = CoachingRequest {
                        character_id: session.fighter(TeamSide::Home).id.clone(),
                        focus,
                        intensity,
                    };
                    // The processor is deterministic, so a preview on a copy
                    // gives the session the exchange will talk about
                    let fighter = session.fighter(TeamSide::Home);
                    let mut preview_profile = fighter.profile.clone();
                    let preview = CoachingEffectProcessor::new().apply(&request, &fighter.traits, &mut preview_profile);
                    let exchange = rt.block_on(narrator.coaching_exchange(session.round(), &preview, &fighter.name));
                    println!("  Coach: {}", exchange.coach_line);
                    println!("  {}: {}", fighter.name, exchange.character_line);
                    session.advance(BattleInput::Coach {
                        request,
                        exchange: Some(exchange),
                    })
                }
                _ => {
                    println!("Focus: mental_health_support, confidence_boost, strategy_drill, team_building, focus_training, ego_check");
                    println!("Intensity: gentle, moderate, firm");
                    continue;
                }
            },
            ["pick", slot, rest @ ..] if !rest.is_empty() => {
                let name = rest.join(" ");
                let mut selection = StrategySelection::new();
                match *slot {
                    "attack" => selection.attack = Some(name),
                    "defense" => selection.defense = Some(name),
                    "special" => selection.special = Some(name),
                    _ => {
                        println!("Slot must be attack, defense or special");
                        continue;
                    }
                }
                session.advance(BattleInput::SelectStrategy {
                    side: TeamSide::Home,
                    selection,
                })
            }
            ["go"] => run_round(&mut session),
            ["auto"] => session.play_out(),
            _ => {
                println!("Unknown command. Available: start, coach, ready, pick, go, auto, status, quit");
                continue;
            }
        };

        match result {
            Ok(events) => {
                print_events(&session, &events);
                let dialogue = rt.block_on(narrator.narrate_events(&events, |id| {
                    TeamSide::both()
                        .into_iter()
                        .map(|side| session.fighter(side))
                        .find(|f| &f.id == id)
                        .map(|f| f.name.clone())
                }));
                for line in dialogue {
                    println!("  Coach: {}", line.coach_response.text);
                    println!("  {}: {}", line.character_id, line.character_reaction.text);
                }
            }
            Err(e) => println!("Rejected: {}", e),
        }

        if session.phase() == BattlePhase::BattleEnd {
            display_rewards(&session, seed);
            break;
        }
    }

    Ok(())
}

/// Lock the selection and fight one full round
fn run_round(session: &mut BattleSession) -> Result<Vec<BattleEvent>> {
    let mut events = Vec::new();
    if session.phase() == BattlePhase::StrategySelection {
        events.extend(session.advance(BattleInput::Proceed)?);
    }
    events.extend(session.advance(BattleInput::ResolveRound)?);
    events.extend(session.advance(BattleInput::FinishRound)?);
    Ok(events)
}

fn parse_focus(raw: &str) -> Option<CoachingFocus> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

fn parse_intensity(raw: &str) -> Option<CoachingIntensity> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

fn print_events(session: &BattleSession, events: &[BattleEvent]) {
    for event in events {
        match event {
            BattleEvent::PhaseChanged { to, .. } => println!("-- {:?}", to),
            BattleEvent::StrategyAccepted { .. } => println!("Strategy accepted"),
            BattleEvent::StrategyAutoFilled { side, categories } => {
                println!("{} auto-filled {:?}", session.side(*side).name, categories)
            }
            BattleEvent::CoachingApplied { session: coaching } => {
                println!("Coaching landed at {:.0}% effectiveness", coaching.effectiveness);
                for (stat, delta) in &coaching.deltas {
                    println!("  {:?} {:+.1}", stat, delta);
                }
            }
            BattleEvent::CoachingAbandoned { character_id } => println!("Coaching with {} timed out", character_id),
            BattleEvent::RoundStarted { round, .. } => println!("\n=== Round {} ===", round),
            BattleEvent::Action { record } => {
                println!("  {}", record.narrative);
                println!(
                    "    ({} HP {:.0}, {} HP {:.0})",
                    record.attacker_id, record.new_attacker_hp, record.defender_id, record.new_defender_hp
                );
            }
            BattleEvent::AdherenceAlert { alert } => {
                println!(
                    "  ! {} is {:?} (adherence {:.0}): {}",
                    alert.character_id,
                    alert.tier,
                    alert.score,
                    alert.reasons.join(", ")
                );
            }
            BattleEvent::RoundEnded {
                home_morale, away_morale, ..
            } => println!("  Morale {:.0} / {:.0}", home_morale, away_morale),
            BattleEvent::BattleEnded { outcome, reason, rounds } => {
                println!("\n*** {:?} after {} rounds ({:?}) ***", outcome, rounds, reason)
            }
            BattleEvent::TimerRequested { .. } | BattleEvent::RogueFacts { .. } => {}
        }
    }
}

fn display_status(session: &BattleSession) {
    let state = session.state();
    println!("\n=== STATUS (round {}/{}) ===", state.round, state.round_cap);
    for view in [&state.home, &state.away] {
        println!(
            "{} - {}: HP {:.0}/{:.0}, morale {:.0}, chemistry {:.0} ({:?})",
            view.team_name, view.fighter_name, view.hp, view.max_hp, view.morale, view.chemistry, view.chemistry_band
        );
    }
    let fighter = session.fighter(TeamSide::Home);
    let p = &fighter.profile;
    println!(
        "{}: stress {:.0}, mental health {:.0}, trust {:.0}, focus {:.0}, adherence {:.0}",
        fighter.name,
        p.stress(),
        p.mental_health(),
        p.team_trust(),
        p.battle_focus(),
        p.gameplan_adherence()
    );
    println!("Abilities:");
    for ability in &fighter.abilities {
        println!("  {:?}: {}", ability.category, ability.name);
    }
    println!();
}

fn display_rewards(session: &BattleSession, seed: u64) {
    let Some(report) = session.report() else {
        return;
    };
    let mut dice = ChaCha8Rng::seed_from_u64(seed);
    let calculator = RewardCalculator::new();
    let skills = SkillProgressionEngine::new(session.config().skill_interactions.clone());
    let opponent_level = session.fighter(TeamSide::Away).level;

    let Some(perf) = report.performances.first() else {
        return;
    };
    let rewards = calculator.calculate(
        perf,
        RewardContext {
            opponent_level,
            round_cap: session.config().battle.round_cap,
            ..Default::default()
        },
        &mut dice,
    );
    let progression = skills.progress(&SkillSet::new(), perf);

    println!("\n=== REWARDS ===");
    println!(
        "XP {} | training points {} | currency {} | bond {:+.1}",
        rewards.xp_gained, rewards.training_points, rewards.currency, rewards.bond_increase
    );
    if let Some(achievement) = rewards.achievement_unlocked {
        println!("Achievement: {:?}", achievement);
    }
    for gain in &progression.gains {
        println!(
            "  {:?}: +{} xp (level {} -> {})",
            gain.category, gain.experience, gain.level_before, gain.level_after
        );
    }
    for change in &report.chemistry {
        println!(
            "Chemistry {:?}: {:.0} -> {:.0}",
            change.side, change.before.value, change.after.value
        );
    }
}
