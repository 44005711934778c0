//! Coach strategy selection and auto-fill
//!
//! The coach picks at most one ability per category. Whatever is missing when
//! the window closes is sampled uniformly from the fighter's abilities in that
//! category, so a round never starts with a blank slot.

use serde::{Deserialize, Serialize};

use crate::battle::fighter::{Ability, AbilityCategory, Fighter};
use crate::core::dice::Dice;
use crate::core::error::{ArenaError, Result};

/// Ability names chosen by the coach, per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySelection {
    pub attack: Option<String>,
    pub defense: Option<String>,
    pub special: Option<String>,
}

impl StrategySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, category: AbilityCategory) -> Option<&str> {
        match category {
            AbilityCategory::Attack => self.attack.as_deref(),
            AbilityCategory::Defense => self.defense.as_deref(),
            AbilityCategory::Special => self.special.as_deref(),
        }
    }

    fn slot_mut(&mut self, category: AbilityCategory) -> &mut Option<String> {
        match category {
            AbilityCategory::Attack => &mut self.attack,
            AbilityCategory::Defense => &mut self.defense,
            AbilityCategory::Special => &mut self.special,
        }
    }

    /// Categories the coach has not filled
    pub fn missing(&self) -> Vec<AbilityCategory> {
        AbilityCategory::all()
            .iter()
            .copied()
            .filter(|c| self.slot(*c).is_none())
            .collect()
    }

    /// Reject names that do not exist or sit in the wrong category
    pub fn validate(&self, fighter: &Fighter) -> Result<()> {
        for category in AbilityCategory::all() {
            let Some(name) = self.slot(*category) else {
                continue;
            };
            match fighter.find_ability(name) {
                Some(ability) if ability.category == *category => {}
                Some(ability) => {
                    return Err(ArenaError::InvalidStrategy(format!(
                        "{} is a {:?} ability, not {:?}",
                        ability.name, ability.category, category
                    )))
                }
                None => {
                    return Err(ArenaError::InvalidStrategy(format!(
                        "{} has no ability named {}",
                        fighter.name, name
                    )))
                }
            }
        }
        Ok(())
    }

    /// Overlay the non-empty slots of `other`
    pub fn merge(&mut self, other: StrategySelection) {
        for category in AbilityCategory::all() {
            if let Some(name) = other.slot(*category) {
                *self.slot_mut(*category) = Some(name.to_string());
            }
        }
    }
}

/// Resolved strategy: one concrete ability per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStrategy {
    pub attack: Ability,
    pub defense: Ability,
    pub special: Ability,
    /// Categories that were sampled instead of chosen
    pub auto_filled: Vec<AbilityCategory>,
}

impl ResolvedStrategy {
    pub fn get(&self, category: AbilityCategory) -> &Ability {
        match category {
            AbilityCategory::Attack => &self.attack,
            AbilityCategory::Defense => &self.defense,
            AbilityCategory::Special => &self.special,
        }
    }
}

/// Turn a (possibly partial) selection into concrete abilities
///
/// Empty categories are sampled uniformly. A category the fighter has no
/// ability for becomes the no-op Focus action.
pub fn resolve_strategy(
    fighter: &Fighter,
    selection: &StrategySelection,
    dice: &mut impl Dice,
) -> ResolvedStrategy {
    if fighter.abilities.is_empty() {
        tracing::warn!(fighter = %fighter.id, "Fighter has no abilities, substituting Focus");
    }

    let mut auto_filled = Vec::new();
    let mut pick = |category: AbilityCategory| -> Ability {
        if let Some(ability) = selection
            .slot(category)
            .and_then(|name| fighter.find_ability(name))
            .filter(|a| a.category == category)
        {
            return ability.clone();
        }

        auto_filled.push(category);
        let options = fighter.abilities_in(category);
        if options.is_empty() {
            return Ability::focus();
        }
        let chosen = options[dice.index(options.len())].clone();
        tracing::debug!(fighter = %fighter.id, ?category, ability = %chosen.name, "Auto-filled strategy slot");
        chosen
    };

    let attack = pick(AbilityCategory::Attack);
    let defense = pick(AbilityCategory::Defense);
    let special = pick(AbilityCategory::Special);

    ResolvedStrategy {
        attack,
        defense,
        special,
        auto_filled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::fighter::{AbilityEffect, CombatStats};
    use crate::core::dice::ScriptedDice;

    fn fighter() -> Fighter {
        Fighter::new("Robin Hood", 90.0, CombatStats::default())
            .with_ability(Ability::new(
                "Longbow",
                AbilityCategory::Attack,
                AbilityEffect::Damage { power: 1.0 },
            ))
            .with_ability(Ability::new(
                "Trick Shot",
                AbilityCategory::Attack,
                AbilityEffect::Damage { power: 1.3 },
            ))
            .with_ability(Ability::new(
                "Cover",
                AbilityCategory::Defense,
                AbilityEffect::Guard { mitigation: 0.3 },
            ))
    }

    #[test]
    fn test_validate_rejects_unknown_and_miscategorised() {
        let f = fighter();
        let unknown = StrategySelection {
            attack: Some("Fireball".into()),
            ..Default::default()
        };
        assert!(unknown.validate(&f).is_err());

        let wrong_slot = StrategySelection {
            defense: Some("Longbow".into()),
            ..Default::default()
        };
        assert!(wrong_slot.validate(&f).is_err());

        let ok = StrategySelection {
            attack: Some("trick shot".into()),
            defense: Some("Cover".into()),
            special: None,
        };
        assert!(ok.validate(&f).is_ok());
        assert_eq!(ok.missing(), vec![AbilityCategory::Special]);
    }

    #[test]
    fn test_auto_fill_samples_category_and_never_blank() {
        let f = fighter();
        let mut dice = ScriptedDice::new().with_indices([1]);
        let resolved = resolve_strategy(&f, &StrategySelection::new(), &mut dice);

        assert_eq!(resolved.attack.name, "Trick Shot");
        assert_eq!(resolved.defense.name, "Cover");
        assert!(resolved.special.is_noop());
        assert_eq!(resolved.auto_filled.len(), 3);
    }

    #[test]
    fn test_explicit_choice_kept() {
        let f = fighter();
        let selection = StrategySelection {
            attack: Some("Longbow".into()),
            ..Default::default()
        };
        let resolved = resolve_strategy(&f, &selection, &mut ScriptedDice::new().with_indices([1]));
        assert_eq!(resolved.attack.name, "Longbow");
        assert!(!resolved.auto_filled.contains(&AbilityCategory::Attack));
    }

    #[test]
    fn test_no_abilities_becomes_focus() {
        let f = Fighter::new("Blank", 50.0, CombatStats::default());
        let resolved = resolve_strategy(&f, &StrategySelection::new(), &mut ScriptedDice::new());
        assert!(resolved.attack.is_noop());
        assert!(resolved.defense.is_noop());
        assert!(resolved.special.is_noop());
    }

    #[test]
    fn test_merge_overlays_filled_slots() {
        let mut base = StrategySelection {
            attack: Some("Longbow".into()),
            ..Default::default()
        };
        base.merge(StrategySelection {
            defense: Some("Cover".into()),
            ..Default::default()
        });
        assert_eq!(base.attack.as_deref(), Some("Longbow"));
        assert_eq!(base.defense.as_deref(), Some("Cover"));
    }
}
