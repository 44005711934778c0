//! Battle system integration tests

use std::sync::Arc;

use rogue_arena::battle::*;
use rogue_arena::core::config::EngineConfig;
use rogue_arena::core::types::{BattleId, MatchResult, TeamSide};
use rogue_arena::team::RelationshipGraph;

fn bundled_setup(seed: u64) -> BattleSetup {
    let roster = load_roster("data/roster.toml").expect("bundled roster");
    let names = roster.team_names();
    roster.setup(names[0], names[1], seed).expect("two teams")
}

fn duelist(name: &str, max_hp: f64) -> Fighter {
    Fighter::new(name, max_hp, CombatStats::default())
        .with_ability(Ability::new("Strike", AbilityCategory::Attack, AbilityEffect::Damage { power: 1.0 }))
        .with_ability(Ability::new("Block", AbilityCategory::Defense, AbilityEffect::Guard { mitigation: 0.25 }))
        .with_ability(Ability::new("Mend", AbilityCategory::Special, AbilityEffect::Heal { amount: 10.0 }))
}

#[test]
fn test_full_battle_from_bundled_roster() {
    let config = Arc::new(EngineConfig::default());
    let mut session = BattleSession::new(BattleId::new(), bundled_setup(11), Arc::clone(&config));

    let events = session.play_out().unwrap();

    assert_eq!(session.phase(), BattlePhase::BattleEnd);
    assert!(session.round() >= 1 && session.round() <= config.battle.round_cap);
    let ended = events
        .iter()
        .filter(|e| matches!(e, BattleEvent::BattleEnded { .. }))
        .count();
    assert_eq!(ended, 1);

    // HP stays in bounds and the last record agrees with the fighters
    for side in TeamSide::both() {
        let fighter = session.fighter(side);
        assert!(fighter.hp() >= 0.0 && fighter.hp() <= fighter.max_hp);
    }
    let last = session.log().records().last().expect("at least one action");
    let attacker_side = if last.attacker_id == session.fighter(TeamSide::Home).id {
        TeamSide::Home
    } else {
        TeamSide::Away
    };
    assert_eq!(last.new_attacker_hp, session.fighter(attacker_side).hp());
    assert_eq!(last.new_defender_hp, session.fighter(attacker_side.opponent()).hp());

    let report = session.report().unwrap();
    assert_eq!(report.performances.len(), 2);
    assert_eq!(report.rounds, session.round());
}

#[test]
fn test_same_seed_replays_identically() {
    let config = Arc::new(EngineConfig::default());
    let mut first = BattleSession::new(BattleId::new(), bundled_setup(2024), Arc::clone(&config));
    let mut second = BattleSession::new(BattleId::new(), bundled_setup(2024), Arc::clone(&config));
    first.play_out().unwrap();
    second.play_out().unwrap();

    assert_eq!(first.log().records(), second.log().records());
    assert_eq!(first.outcome(), second.outcome());
}

#[test]
fn test_reset_replays_from_setup() {
    let mut session = BattleSession::new(BattleId::new(), bundled_setup(5), Arc::new(EngineConfig::default()));
    session.play_out().unwrap();
    let first_log = session.log().records().to_vec();

    session.reset();
    assert_eq!(session.phase(), BattlePhase::PreBattle);
    assert!(session.log().is_empty());
    session.play_out().unwrap();
    assert_eq!(session.log().records(), first_log.as_slice());
}

#[test]
fn test_log_is_append_only_across_rounds() {
    let mut session = BattleSession::new(
        BattleId::new(),
        BattleSetup {
            home: TeamEntry::new("A", duelist("Ada", 2_000.0)),
            away: TeamEntry::new("B", duelist("Babbage", 2_000.0)),
            relationships: RelationshipGraph::new(),
            seed: 8,
        },
        Arc::new(EngineConfig::default()),
    );
    session.advance(BattleInput::StartBattle).unwrap();
    session.advance(BattleInput::EndHuddle).unwrap();

    let mut snapshot: Vec<CombatRoundRecord> = Vec::new();
    while session.phase() != BattlePhase::BattleEnd {
        session.advance(BattleInput::Proceed).unwrap();
        session.advance(BattleInput::ResolveRound).unwrap();

        let records = session.log().records();
        assert_eq!(&records[..snapshot.len()], snapshot.as_slice());
        assert!(records[snapshot.len()..].iter().all(|r| r.round == session.round()));
        snapshot = records.to_vec();

        session.advance(BattleInput::FinishRound).unwrap();
    }

    // Huge HP pools only end at the cap
    assert_eq!(session.outcome(), Some(BattleOutcome::Draw));
    let report = session.report().unwrap();
    assert_eq!(report.reason, EndReason::RoundCap);
    assert!(report.performances.iter().all(|p| p.result == MatchResult::Draw));
}

#[test]
fn test_special_replaces_attack_every_third_round() {
    let mut session = BattleSession::new(
        BattleId::new(),
        BattleSetup {
            home: TeamEntry::new("A", duelist("Ada", 2_000.0)),
            away: TeamEntry::new("B", duelist("Babbage", 2_000.0)),
            relationships: RelationshipGraph::new(),
            seed: 3,
        },
        Arc::new(EngineConfig::default()),
    );
    session.play_out().unwrap();

    for record in session.log().records().iter().filter(|r| !r.is_rogue()) {
        let expected = if record.round % 3 == 0 { "Mend" } else { "Strike" };
        assert_eq!(record.ability.as_deref(), Some(expected), "round {}", record.round);
    }
}

#[test]
fn test_registry_keeps_battles_apart() {
    let config = Arc::new(EngineConfig::default());
    let huddle = config.timers.huddle_ms;
    let mut registry = BattleRegistry::new(config);

    let ids: Vec<BattleId> = (0..3).map(|seed| registry.create(bundled_setup(seed))).collect();
    for id in &ids[..2] {
        registry.advance(*id, BattleInput::StartBattle, 0).unwrap();
    }

    let fired = registry.poll(huddle);
    assert_eq!(fired.len(), 2);
    assert_eq!(registry.get(ids[0]).unwrap().phase(), BattlePhase::StrategySelection);
    assert_eq!(registry.get(ids[1]).unwrap().phase(), BattlePhase::StrategySelection);
    assert_eq!(registry.get(ids[2]).unwrap().phase(), BattlePhase::PreBattle);

    // Aborting one battle leaves the other's selection timer armed
    registry.abort(ids[0]);
    assert_eq!(registry.pending_timers(), 1);
}
