//! Effective health pool under the standard-hit model.
//!
//! Per damage type, a layered mitigation fraction is composed from the
//! deterministic part (armour curve for physical, capped resistance for the
//! rest) and the probabilistic part (block and evasion folded in as
//! expected values), then `EHP = pool / (1 - total_reduction)`.
//!
//! Probabilistic defenses are averaged, not guaranteed: the output must be
//! presented as an approximation, never a survival floor. The notes on
//! [EhpResult] carry that caveat for user-facing callers.

use serde::{Deserialize, Serialize};

use crate::analysis::aggregator::{AggregatedStats, StatCompleteness};

/// Reduction is capped strictly below 1.0 so EHP stays finite; a 100%
/// reduction input is treated as this value instead of dividing by zero.
pub const MAX_TOTAL_REDUCTION: f64 = 0.999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Physical,
    Fire,
    Cold,
    Lightning,
    Chaos,
}

impl DamageType {
    pub const ALL: [DamageType; 5] = [
        DamageType::Physical,
        DamageType::Fire,
        DamageType::Cold,
        DamageType::Lightning,
        DamageType::Chaos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Fire => "fire",
            Self::Cold => "cold",
            Self::Lightning => "lightning",
            Self::Chaos => "chaos",
        }
    }
}

impl std::fmt::Display for DamageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables of the standard-hit methodology. The damage-mix weighting is
/// supplied configuration because "typical" content damage changes with
/// balance patches; it is never baked into the math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EhpConfig {
    /// Bumped whenever the methodology changes; part of the memo cache key
    /// so EHP values computed under old settings are never reused.
    pub version: String,
    /// Reference hit size the armour curve is evaluated against.
    pub standard_hit: f64,
    /// Resistance ceiling in percent. Values above contribute nothing.
    pub resistance_cap: f64,
    /// Blend weights per damage type; normalized before use.
    pub damage_weights: Vec<(DamageType, f64)>,
}

impl Default for EhpConfig {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            standard_hit: 1000.0,
            resistance_cap: 75.0,
            damage_weights: DamageType::ALL.iter().map(|&ty| (ty, 1.0)).collect(),
        }
    }
}

impl EhpConfig {
    fn weight(&self, ty: DamageType) -> f64 {
        self.damage_weights
            .iter()
            .find(|(t, _)| *t == ty)
            .map(|(_, w)| w.max(0.0))
            .unwrap_or(0.0)
    }
}

/// Mitigation inputs for one damage type, derived from [AggregatedStats].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageMitigationProfile {
    /// Physical only; zero for other types.
    pub armour: f64,
    /// Uncapped resistance percent (may be negative for chaos).
    pub resistance: f64,
    /// Percent in [0, 100].
    pub block_chance: f64,
    /// Attacker chance to hit in [0, 1] after evasion.
    pub hit_chance: f64,
}

impl DamageMitigationProfile {
    pub fn for_type(stats: &AggregatedStats, ty: DamageType) -> Self {
        let resistance = match ty {
            DamageType::Physical => 0.0,
            DamageType::Fire => stats.fire_resistance,
            DamageType::Cold => stats.cold_resistance,
            DamageType::Lightning => stats.lightning_resistance,
            DamageType::Chaos => stats.chaos_resistance,
        };
        Self {
            armour: if ty == DamageType::Physical { stats.armour } else { 0.0 },
            resistance,
            block_chance: stats.block_chance,
            hit_chance: hit_chance(stats.accuracy_assumption, stats.evasion_rating),
        }
    }
}

/// Attacker chance to hit through evasion: `accuracy / (accuracy + evasion)`.
pub fn hit_chance(accuracy: f64, evasion: f64) -> f64 {
    let accuracy = accuracy.max(1.0);
    let evasion = evasion.max(0.0);
    accuracy / (accuracy + evasion)
}

/// Per-type and blended EHP outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EhpResult {
    /// EHP per damage type, in [DamageType::ALL] order.
    pub per_type: Vec<(DamageType, f64)>,
    /// Total reduction fraction per damage type, same order.
    pub reductions: Vec<(DamageType, f64)>,
    /// Weighted aggregate across the five damage types.
    pub blended: f64,
    /// True when life and energy shield were both absent upstream; the
    /// values are still computed on defaulted-zero data but are unreliable.
    pub incomplete: bool,
    /// Fixed methodology caveats for user-facing output.
    pub notes: Vec<String>,
}

impl EhpResult {
    pub fn for_type(&self, ty: DamageType) -> f64 {
        self.per_type
            .iter()
            .find(|(t, _)| *t == ty)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }
}

/// Deterministic reduction for one damage type: armour curve for physical,
/// capped resistance for everything else.
fn deterministic_reduction(profile: &DamageMitigationProfile, ty: DamageType, config: &EhpConfig) -> f64 {
    match ty {
        DamageType::Physical => {
            let armour = profile.armour.max(0.0);
            // Diminishing-returns curve: doubling armour never doubles mitigation.
            armour / (armour + 10.0 * config.standard_hit.max(1.0))
        }
        _ => profile.resistance.min(config.resistance_cap) / 100.0,
    }
}

/// Expected-value reduction from block and evasion combined:
/// `1 - (1 - block) * hit_chance`.
fn probabilistic_reduction(profile: &DamageMitigationProfile) -> f64 {
    let block = (profile.block_chance / 100.0).clamp(0.0, 1.0);
    let hit = profile.hit_chance.clamp(0.0, 1.0);
    1.0 - (1.0 - block) * hit
}

fn total_reduction(profile: &DamageMitigationProfile, ty: DamageType, config: &EhpConfig) -> f64 {
    let deterministic = deterministic_reduction(profile, ty, config);
    let probabilistic = probabilistic_reduction(profile);
    let total = 1.0 - (1.0 - deterministic) * (1.0 - probabilistic);
    total.min(MAX_TOTAL_REDUCTION)
}

/// Compute per-type and blended EHP for one character.
///
/// Pure over its inputs; identical stats always yield identical output.
pub fn compute_ehp(
    stats: &AggregatedStats,
    completeness: StatCompleteness,
    config: &EhpConfig,
) -> EhpResult {
    let pool = stats.hp_pool();

    let mut per_type = Vec::with_capacity(DamageType::ALL.len());
    let mut reductions = Vec::with_capacity(DamageType::ALL.len());
    for &ty in &DamageType::ALL {
        let profile = DamageMitigationProfile::for_type(stats, ty);
        let reduction = total_reduction(&profile, ty, config);
        per_type.push((ty, pool / (1.0 - reduction)));
        reductions.push((ty, reduction));
    }

    let weight_sum: f64 = DamageType::ALL.iter().map(|&ty| config.weight(ty)).sum();
    let blended = if weight_sum > 0.0 {
        per_type
            .iter()
            .map(|&(ty, ehp)| ehp * config.weight(ty))
            .sum::<f64>()
            / weight_sum
    } else {
        0.0
    };

    EhpResult {
        per_type,
        reductions,
        blended,
        incomplete: completeness.is_incomplete(),
        notes: vec![
            format!("evaluated against a {:.0} damage standard hit", config.standard_hit),
            format!("resistances capped at {:.0}%", config.resistance_cap),
            "block and evasion are expected-value approximations, not a guaranteed floor"
                .to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::DEFAULT_ACCURACY_ASSUMPTION;

    fn stats(life: f64, es: f64) -> AggregatedStats {
        AggregatedStats {
            life,
            energy_shield: es,
            armour: 0.0,
            fire_resistance: 0.0,
            cold_resistance: 0.0,
            lightning_resistance: 0.0,
            chaos_resistance: 0.0,
            block_chance: 0.0,
            evasion_rating: 0.0,
            accuracy_assumption: DEFAULT_ACCURACY_ASSUMPTION,
            level: 90,
        }
    }

    fn complete() -> StatCompleteness {
        StatCompleteness::default()
    }

    #[test]
    fn zero_armour_means_physical_ehp_equals_pool() {
        let result = compute_ehp(&stats(4000.0, 1000.0), complete(), &EhpConfig::default());
        assert_eq!(result.for_type(DamageType::Physical), 5000.0);
    }

    #[test]
    fn armour_ten_thousand_halves_standard_hit() {
        let mut s = stats(4000.0, 1000.0);
        s.armour = 10_000.0;
        let result = compute_ehp(&s, complete(), &EhpConfig::default());
        // 10000 / (10000 + 10 * 1000) = 0.5 -> 5000 / 0.5 = 10000
        assert!((result.for_type(DamageType::Physical) - 10_000.0).abs() < 1e-9);
        assert_eq!(result.for_type(DamageType::Fire), 5000.0);
    }

    #[test]
    fn resistance_above_cap_contributes_nothing_extra() {
        let mut s = stats(1000.0, 0.0);
        s.fire_resistance = 100.0;
        let capped = compute_ehp(&s, complete(), &EhpConfig::default());
        s.fire_resistance = 75.0;
        let at_cap = compute_ehp(&s, complete(), &EhpConfig::default());
        assert_eq!(
            capped.for_type(DamageType::Fire),
            at_cap.for_type(DamageType::Fire)
        );
        // 75% reduction -> 1000 / 0.25 = 4000
        assert!((capped.for_type(DamageType::Fire) - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn negative_chaos_resistance_lowers_ehp_below_pool() {
        let mut s = stats(1000.0, 0.0);
        s.chaos_resistance = -60.0;
        let result = compute_ehp(&s, complete(), &EhpConfig::default());
        // -60% reduction -> 1000 / 1.6 = 625
        assert!((result.for_type(DamageType::Chaos) - 625.0).abs() < 1e-9);
    }

    #[test]
    fn full_reduction_is_capped_not_divided_by_zero() {
        let mut s = stats(1000.0, 0.0);
        s.block_chance = 100.0;
        let result = compute_ehp(&s, complete(), &EhpConfig::default());
        let physical = result.for_type(DamageType::Physical);
        assert!(physical.is_finite());
        assert!((physical - 1000.0 / (1.0 - MAX_TOTAL_REDUCTION)).abs() < 1e-6);
    }

    #[test]
    fn armour_increase_never_decreases_physical_ehp() {
        let mut previous = 0.0;
        for armour in [0.0, 100.0, 1000.0, 10_000.0, 100_000.0, 1e9] {
            let mut s = stats(5000.0, 0.0);
            s.armour = armour;
            let ehp = compute_ehp(&s, complete(), &EhpConfig::default())
                .for_type(DamageType::Physical);
            assert!(ehp >= previous, "armour {armour} regressed EHP: {ehp} < {previous}");
            previous = ehp;
        }
    }

    #[test]
    fn resistance_increase_never_decreases_that_types_ehp() {
        let mut previous = 0.0;
        for res in [-100.0, -30.0, 0.0, 40.0, 75.0, 90.0, 200.0] {
            let mut s = stats(5000.0, 0.0);
            s.cold_resistance = res;
            let ehp =
                compute_ehp(&s, complete(), &EhpConfig::default()).for_type(DamageType::Cold);
            assert!(ehp >= previous, "resistance {res} regressed EHP");
            previous = ehp;
        }
    }

    #[test]
    fn evasion_folds_in_as_expected_value() {
        let mut s = stats(1000.0, 0.0);
        s.evasion_rating = 1000.0;
        let result = compute_ehp(&s, complete(), &EhpConfig::default());
        // hit chance 0.5 -> probabilistic reduction 0.5 -> EHP doubles
        assert!((result.for_type(DamageType::Physical) - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn incomplete_stats_still_produce_values_but_flagged() {
        let completeness = StatCompleteness {
            missing_life: true,
            missing_energy_shield: true,
        };
        let result = compute_ehp(&stats(0.0, 0.0), completeness, &EhpConfig::default());
        assert!(result.incomplete);
        assert_eq!(result.blended, 0.0);
        assert_eq!(result.per_type.len(), 5);
    }

    #[test]
    fn blended_uses_supplied_weights() {
        let mut s = stats(1000.0, 0.0);
        s.fire_resistance = 75.0;
        let config = EhpConfig {
            damage_weights: vec![(DamageType::Fire, 1.0)],
            ..EhpConfig::default()
        };
        let result = compute_ehp(&s, complete(), &config);
        assert_eq!(result.blended, result.for_type(DamageType::Fire));
    }

    #[test]
    fn equal_weights_blend_is_plain_average() {
        let s = stats(1000.0, 0.0);
        let result = compute_ehp(&s, complete(), &EhpConfig::default());
        let mean: f64 = result.per_type.iter().map(|(_, v)| v).sum::<f64>() / 5.0;
        assert!((result.blended - mean).abs() < 1e-9);
    }
}
