//! Stat aggregation: normalizes a raw build record into the canonical
//! numeric profile the EHP and categorization math runs on.
//!
//! Defaulting rules are deliberate and documented per field: missing life/ES
//! marks the record incomplete (downstream must surface that, not hide it),
//! while missing mitigation fields default to zero as an intentional
//! worst-case assumption. Out-of-range chances are clamped, not rejected,
//! because upstream ladder data is unverified.

use serde::{Deserialize, Serialize};

use crate::data::record::RawBuildRecord;

/// Reference attacker accuracy used to turn evasion into a hit chance.
pub const DEFAULT_ACCURACY_ASSUMPTION: f64 = 1000.0;

/// Normalized numeric profile for one character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub life: f64,
    pub energy_shield: f64,
    pub armour: f64,
    pub fire_resistance: f64,
    pub cold_resistance: f64,
    pub lightning_resistance: f64,
    pub chaos_resistance: f64,
    /// Percent in [0, 100].
    pub block_chance: f64,
    pub evasion_rating: f64,
    /// Attacker accuracy the evasion math is evaluated against.
    pub accuracy_assumption: f64,
    pub level: u32,
}

impl AggregatedStats {
    pub fn hp_pool(&self) -> f64 {
        self.life + self.energy_shield
    }
}

/// Which inputs were absent and got defaulted. Life/ES absence is the signal
/// that makes EHP and defense-style output unreliable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCompleteness {
    pub missing_life: bool,
    pub missing_energy_shield: bool,
}

impl StatCompleteness {
    /// True when the HP pool is entirely defaulted and EHP cannot be trusted.
    pub fn is_incomplete(&self) -> bool {
        self.missing_life && self.missing_energy_shield
    }
}

/// Normalize a raw record. Pure and side-effect free; safe to call
/// repeatedly and in any order.
pub fn aggregate(record: &RawBuildRecord) -> (AggregatedStats, StatCompleteness) {
    let completeness = StatCompleteness {
        missing_life: record.life.is_none(),
        missing_energy_shield: record.energy_shield.is_none(),
    };

    let stats = AggregatedStats {
        life: record.life.unwrap_or(0.0).max(0.0),
        energy_shield: record.energy_shield.unwrap_or(0.0).max(0.0),
        // Missing mitigation means no mitigation, distinct from "unknown".
        armour: record.armour.unwrap_or(0.0).max(0.0),
        // Resistances may legitimately be negative (chaos in particular);
        // only a missing value defaults to zero.
        fire_resistance: record.fire_resistance.unwrap_or(0.0),
        cold_resistance: record.cold_resistance.unwrap_or(0.0),
        lightning_resistance: record.lightning_resistance.unwrap_or(0.0),
        chaos_resistance: record.chaos_resistance.unwrap_or(0.0),
        block_chance: record.block_chance.unwrap_or(0.0).clamp(0.0, 100.0),
        evasion_rating: record.evasion.unwrap_or(0.0).max(0.0),
        accuracy_assumption: DEFAULT_ACCURACY_ASSUMPTION,
        level: record.level.max(1),
    };

    (stats, completeness)
}
