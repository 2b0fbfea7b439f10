//! Per-axis label popularity over a filtered result set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::categorizer::CategorizedBuild;

/// Label counts per category axis. Every build contributes exactly one
/// label per axis (including `unknown`), so each axis's counts sum to the
/// size of the set they were computed over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityStats {
    pub total: usize,
    pub damage_type: BTreeMap<String, usize>,
    pub defense_style: BTreeMap<String, usize>,
    pub cost_tier: BTreeMap<String, usize>,
    pub skill_delivery: BTreeMap<String, usize>,
}

impl PopularityStats {
    pub fn from_builds(builds: &[CategorizedBuild]) -> Self {
        let mut stats = PopularityStats {
            total: builds.len(),
            ..PopularityStats::default()
        };
        for build in builds {
            bump(&mut stats.damage_type, build.labels.damage_type.as_str());
            bump(&mut stats.defense_style, build.labels.defense_style.as_str());
            bump(&mut stats.cost_tier, build.labels.cost_tier.as_str());
            bump(&mut stats.skill_delivery, build.labels.skill_delivery.as_str());
        }
        stats
    }
}

/// Signed per-axis label-count changes between two popularity aggregates,
/// e.g. two snapshots of one league. Labels whose count did not change are
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityShift {
    pub total_before: usize,
    pub total_after: usize,
    pub damage_type: BTreeMap<String, i64>,
    pub defense_style: BTreeMap<String, i64>,
    pub cost_tier: BTreeMap<String, i64>,
    pub skill_delivery: BTreeMap<String, i64>,
}

impl PopularityStats {
    /// Label-count movement from `self` (the earlier aggregate) to `later`.
    pub fn shift_to(&self, later: &PopularityStats) -> PopularityShift {
        PopularityShift {
            total_before: self.total,
            total_after: later.total,
            damage_type: axis_shift(&self.damage_type, &later.damage_type),
            defense_style: axis_shift(&self.defense_style, &later.defense_style),
            cost_tier: axis_shift(&self.cost_tier, &later.cost_tier),
            skill_delivery: axis_shift(&self.skill_delivery, &later.skill_delivery),
        }
    }
}

fn axis_shift(
    before: &BTreeMap<String, usize>,
    after: &BTreeMap<String, usize>,
) -> BTreeMap<String, i64> {
    let mut shift = BTreeMap::new();
    for label in before.keys().chain(after.keys()) {
        let b = before.get(label).copied().unwrap_or(0) as i64;
        let a = after.get(label).copied().unwrap_or(0) as i64;
        if a != b {
            shift.insert(label.clone(), a - b);
        }
    }
    shift
}

fn bump(axis: &mut BTreeMap<String, usize>, label: &str) {
    *axis.entry(label.to_string()).or_insert(0) += 1;
}
