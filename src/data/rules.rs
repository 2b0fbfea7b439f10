//! Versioned categorization rule tables.
//!
//! All classification signals live here as data, not code: adding a tag or
//! rebalancing a threshold after a game patch means editing the YAML file
//! (or the compiled-in defaults), never the classifier logic. The tables
//! are loaded once and shared immutably.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::ehp::DamageType;

pub const DEFAULT_RULES_FILE: &str = "categorizer.yaml";

/// Scoring weight of the primary skill's own tags.
pub const PRIMARY_SKILL_WEIGHT: f64 = 3.0;
/// Scoring weight of support/secondary skill tags.
pub const SUPPORT_SKILL_WEIGHT: f64 = 1.0;

/// Skill-delivery mechanisms a skill's tags can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMechanic {
    Melee,
    SelfCast,
    Totem,
    Minion,
    Bow,
    TrapMine,
}

impl DeliveryMechanic {
    pub const ALL: [DeliveryMechanic; 6] = [
        DeliveryMechanic::Melee,
        DeliveryMechanic::SelfCast,
        DeliveryMechanic::Totem,
        DeliveryMechanic::Minion,
        DeliveryMechanic::Bow,
        DeliveryMechanic::TrapMine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::SelfCast => "self_cast",
            Self::Totem => "totem",
            Self::Minion => "minion",
            Self::Bow => "bow",
            Self::TrapMine => "trap_mine",
        }
    }
}

/// Tag names that mark a skill as dealing one damage type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageTagEntry {
    pub damage_type: DamageType,
    pub tags: Vec<String>,
}

/// Tag names that mark a skill as using one delivery mechanic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTagEntry {
    pub mechanic: DeliveryMechanic,
    pub tags: Vec<String>,
}

/// Defense-style thresholds on effective pool per character level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseThresholds {
    /// Pool-per-level at or above which a build rates tanky.
    pub tanky: f64,
    /// Pool-per-level at or above which a build rates balanced.
    pub balanced: f64,
}

impl Default for DefenseThresholds {
    fn default() -> Self {
        Self { tanky: 80.0, balanced: 50.0 }
    }
}

/// The full rule set the categorizer is constructed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizerRules {
    /// Bumped whenever a table changes; part of the memo cache key so stale
    /// categorizations are never reused across rule updates.
    pub version: String,
    pub damage_tags: Vec<DamageTagEntry>,
    pub delivery_tags: Vec<DeliveryTagEntry>,
    /// Tie-break order when a skill carries several delivery tags, highest
    /// priority first. This ordering has no authoritative source in the
    /// game data and is provided as configuration precisely so it can be
    /// corrected without touching the classifier.
    pub delivery_priority: Vec<DeliveryMechanic>,
    pub defense_thresholds: DefenseThresholds,
}

impl Default for CategorizerRules {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            damage_tags: vec![
                damage_entry(DamageType::Physical, &["Physical"]),
                damage_entry(DamageType::Fire, &["Fire"]),
                damage_entry(DamageType::Cold, &["Cold"]),
                damage_entry(DamageType::Lightning, &["Lightning"]),
                damage_entry(DamageType::Chaos, &["Chaos"]),
            ],
            delivery_tags: vec![
                delivery_entry(DeliveryMechanic::Melee, &["Melee", "Strike"]),
                delivery_entry(DeliveryMechanic::SelfCast, &["Spell"]),
                delivery_entry(DeliveryMechanic::Totem, &["Totem"]),
                delivery_entry(DeliveryMechanic::Minion, &["Minion", "Golem"]),
                delivery_entry(DeliveryMechanic::Bow, &["Bow"]),
                delivery_entry(DeliveryMechanic::TrapMine, &["Trap", "Mine"]),
            ],
            delivery_priority: vec![
                DeliveryMechanic::Totem,
                DeliveryMechanic::Minion,
                DeliveryMechanic::TrapMine,
                DeliveryMechanic::Bow,
                DeliveryMechanic::Melee,
                DeliveryMechanic::SelfCast,
            ],
            defense_thresholds: DefenseThresholds::default(),
        }
    }
}

impl CategorizerRules {
    /// Damage-type tag table as (type, tag) lookup pairs.
    pub fn damage_tags_for(&self, ty: DamageType) -> &[String] {
        self.damage_tags
            .iter()
            .find(|entry| entry.damage_type == ty)
            .map(|entry| entry.tags.as_slice())
            .unwrap_or(&[])
    }

    /// Mechanics whose tag set intersects the given skill tags.
    pub fn mechanics_for_tags(&self, tags: &[String]) -> Vec<DeliveryMechanic> {
        self.delivery_tags
            .iter()
            .filter(|entry| entry.tags.iter().any(|tag| tags.iter().any(|t| t == tag)))
            .map(|entry| entry.mechanic)
            .collect()
    }

    /// Pick the highest-priority mechanic among candidates, per the
    /// configured tie-break order. None when no candidate is listed.
    pub fn highest_priority(&self, candidates: &[DeliveryMechanic]) -> Option<DeliveryMechanic> {
        self.delivery_priority
            .iter()
            .find(|mechanic| candidates.contains(mechanic))
            .copied()
    }
}

fn damage_entry(damage_type: DamageType, tags: &[&str]) -> DamageTagEntry {
    DamageTagEntry {
        damage_type,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn delivery_entry(mechanic: DeliveryMechanic, tags: &[&str]) -> DeliveryTagEntry {
    DeliveryTagEntry {
        mechanic,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// Load rules from a YAML file, or fall back to the compiled-in defaults
/// when the file is missing. A present-but-invalid file is an error.
pub fn load_rules(path: &Path) -> Result<CategorizerRules, RulesError> {
    if !path.exists() {
        return Ok(CategorizerRules::default());
    }
    let raw = fs::read_to_string(path).map_err(RulesError::Read)?;
    let rules: CategorizerRules = serde_yaml::from_str(&raw).map_err(RulesError::Parse)?;
    Ok(rules)
}

#[derive(Debug)]
pub enum RulesError {
    Read(std::io::Error),
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for RulesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read rules file: {err}"),
            Self::Parse(err) => write!(f, "failed to parse rules YAML: {err}"),
        }
    }
}

impl std::error::Error for RulesError {}
