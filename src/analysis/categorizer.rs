//! Multi-signal build classification.
//!
//! Four independent sub-classifiers (damage type, defense style, cost tier,
//! skill delivery), each a pure function of the aggregated stats, the EHP
//! result, and the skill/item tags. One axis failing to find a signal
//! degrades to `unknown` for that axis only; the others still run.
//!
//! All signal tables come from the [RulesRegistry] the categorizer is
//! constructed with, never from inline constants.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::aggregator::{aggregate, AggregatedStats};
use crate::analysis::ehp::{compute_ehp, DamageType, EhpResult};
use crate::data::record::RawBuildRecord;
use crate::data::registry::RulesRegistry;
use crate::data::rules::{DeliveryMechanic, PRIMARY_SKILL_WEIGHT, SUPPORT_SKILL_WEIGHT};

/// Primary damage type label. `Unknown` is a valid outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageTypeLabel {
    Fire,
    Cold,
    Lightning,
    Physical,
    Chaos,
    Unknown,
}

impl DamageTypeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Cold => "cold",
            Self::Lightning => "lightning",
            Self::Physical => "physical",
            Self::Chaos => "chaos",
            Self::Unknown => "unknown",
        }
    }

    /// The concrete damage type behind the label, when there is one.
    pub fn damage_type(self) -> Option<DamageType> {
        match self {
            Self::Fire => Some(DamageType::Fire),
            Self::Cold => Some(DamageType::Cold),
            Self::Lightning => Some(DamageType::Lightning),
            Self::Physical => Some(DamageType::Physical),
            Self::Chaos => Some(DamageType::Chaos),
            Self::Unknown => None,
        }
    }

    fn from_damage_type(ty: DamageType) -> Self {
        match ty {
            DamageType::Fire => Self::Fire,
            DamageType::Cold => Self::Cold,
            DamageType::Lightning => Self::Lightning,
            DamageType::Physical => Self::Physical,
            DamageType::Chaos => Self::Chaos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseStyle {
    Tanky,
    Balanced,
    Squishy,
    Unknown,
}

impl DefenseStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tanky => "tanky",
            Self::Balanced => "balanced",
            Self::Squishy => "squishy",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Budget,
    Moderate,
    Expensive,
    Luxury,
}

impl CostTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Moderate => "moderate",
            Self::Expensive => "expensive",
            Self::Luxury => "luxury",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillDelivery {
    Melee,
    SelfCast,
    Totem,
    Minion,
    Bow,
    TrapMine,
    Unknown,
}

impl SkillDelivery {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::SelfCast => "self_cast",
            Self::Totem => "totem",
            Self::Minion => "minion",
            Self::Bow => "bow",
            Self::TrapMine => "trap_mine",
            Self::Unknown => "unknown",
        }
    }

    fn from_mechanic(mechanic: DeliveryMechanic) -> Self {
        match mechanic {
            DeliveryMechanic::Melee => Self::Melee,
            DeliveryMechanic::SelfCast => Self::SelfCast,
            DeliveryMechanic::Totem => Self::Totem,
            DeliveryMechanic::Minion => Self::Minion,
            DeliveryMechanic::Bow => Self::Bow,
            DeliveryMechanic::TrapMine => Self::TrapMine,
        }
    }
}

/// Error for label strings outside the enumerated sets (caller-supplied
/// filter values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelParseError {
    pub axis: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl std::fmt::Display for LabelParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} '{}' (expected one of: {})",
            self.axis, self.value, self.expected
        )
    }
}

impl std::error::Error for LabelParseError {}

impl FromStr for DamageTypeLabel {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fire" => Ok(Self::Fire),
            "cold" => Ok(Self::Cold),
            "lightning" => Ok(Self::Lightning),
            "physical" => Ok(Self::Physical),
            "chaos" => Ok(Self::Chaos),
            "unknown" => Ok(Self::Unknown),
            _ => Err(LabelParseError {
                axis: "damage_type",
                value: s.to_string(),
                expected: "fire, cold, lightning, physical, chaos, unknown",
            }),
        }
    }
}

impl FromStr for DefenseStyle {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tanky" => Ok(Self::Tanky),
            "balanced" => Ok(Self::Balanced),
            "squishy" => Ok(Self::Squishy),
            "unknown" => Ok(Self::Unknown),
            _ => Err(LabelParseError {
                axis: "defense_style",
                value: s.to_string(),
                expected: "tanky, balanced, squishy, unknown",
            }),
        }
    }
}

impl FromStr for CostTier {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "budget" => Ok(Self::Budget),
            "moderate" => Ok(Self::Moderate),
            "expensive" => Ok(Self::Expensive),
            "luxury" => Ok(Self::Luxury),
            _ => Err(LabelParseError {
                axis: "cost_tier",
                value: s.to_string(),
                expected: "budget, moderate, expensive, luxury",
            }),
        }
    }
}

impl FromStr for SkillDelivery {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "melee" => Ok(Self::Melee),
            "self_cast" => Ok(Self::SelfCast),
            "totem" => Ok(Self::Totem),
            "minion" => Ok(Self::Minion),
            "bow" => Ok(Self::Bow),
            "trap_mine" => Ok(Self::TrapMine),
            "unknown" => Ok(Self::Unknown),
            _ => Err(LabelParseError {
                axis: "skill_delivery",
                value: s.to_string(),
                expected: "melee, self_cast, totem, minion, bow, trap_mine, unknown",
            }),
        }
    }
}

/// Classification outcome for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabels {
    pub damage_type: DamageTypeLabel,
    pub defense_style: DefenseStyle,
    pub cost_tier: CostTier,
    pub skill_delivery: SkillDelivery,
}

impl CategoryLabels {
    pub fn unknown() -> Self {
        Self {
            damage_type: DamageTypeLabel::Unknown,
            defense_style: DefenseStyle::Unknown,
            cost_tier: CostTier::Budget,
            skill_delivery: SkillDelivery::Unknown,
        }
    }

    /// One-line human-readable summary for bot/dashboard callers. Always
    /// surfaces unreliable EHP rather than hiding it.
    pub fn summary(&self, ehp: &EhpResult) -> String {
        let ehp_part = if ehp.incomplete {
            "EHP: unreliable (missing life/ES)".to_string()
        } else {
            format!("EHP: {:.0}", ehp.blended)
        };
        format!(
            "{} | {} | {} | {} | {}",
            title_case(self.damage_type.as_str()),
            title_case(self.skill_delivery.as_str()),
            title_case(self.defense_style.as_str()),
            title_case(self.cost_tier.as_str()),
            ehp_part
        )
    }
}

fn title_case(label: &str) -> String {
    label
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Skill and item tag inputs to classification, pre-extracted from a raw
/// record so the classifiers stay independent of the record shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTags {
    /// Tags of the primary skill, when known.
    pub primary_skill_tags: Vec<String>,
    /// Tag sets of secondary/aura skills.
    pub secondary_skill_tags: Vec<Vec<String>>,
    /// Tag sets of supports socketed with the primary skill.
    pub support_tags: Vec<Vec<String>>,
    /// Equipped unique item names.
    pub item_names: Vec<String>,
    /// Link count of the main skill's hosting item.
    pub main_links: u32,
}

impl BuildTags {
    pub fn from_record(record: &RawBuildRecord) -> Self {
        let setup = record.main_skill_setup.clone().unwrap_or_default();
        Self {
            primary_skill_tags: record
                .main_skill
                .as_ref()
                .map(|skill| skill.tags.clone())
                .unwrap_or_default(),
            secondary_skill_tags: record.skills.iter().map(|s| s.tags.clone()).collect(),
            support_tags: setup.support_gems.iter().map(|g| g.tags.clone()).collect(),
            item_names: record.unique_items.iter().map(|i| i.name.clone()).collect(),
            main_links: setup.links,
        }
    }
}

/// A raw record joined with its derived EHP and labels: the unit the query
/// layer returns to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedBuild {
    pub record: RawBuildRecord,
    pub ehp: EhpResult,
    pub labels: CategoryLabels,
}

/// Classifier over an immutable rule registry. Categorization is a pure
/// function of its inputs; the registry never changes after construction.
#[derive(Debug, Clone)]
pub struct BuildCategorizer {
    registry: Arc<RulesRegistry>,
}

impl BuildCategorizer {
    pub fn new(registry: Arc<RulesRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RulesRegistry {
        &self.registry
    }

    /// Classify one build on all four axes.
    pub fn categorize(
        &self,
        stats: &AggregatedStats,
        ehp: &EhpResult,
        tags: &BuildTags,
    ) -> CategoryLabels {
        CategoryLabels {
            damage_type: self.classify_damage_type(tags),
            defense_style: self.classify_defense_style(stats, ehp),
            cost_tier: self.classify_cost_tier(tags),
            skill_delivery: self.classify_skill_delivery(tags),
        }
    }

    /// Full pipeline for one raw record: aggregate, compute EHP, classify.
    pub fn categorize_record(&self, record: &RawBuildRecord) -> CategorizedBuild {
        let (stats, completeness) = aggregate(record);
        let ehp = compute_ehp(&stats, completeness, &self.registry.ehp);
        let tags = BuildTags::from_record(record);
        let labels = self.categorize(&stats, &ehp, &tags);
        CategorizedBuild {
            record: record.clone(),
            ehp,
            labels,
        }
    }

    /// Damage type by summed tag weight over the active skill set. The
    /// primary skill's tags weigh more than supports and secondary skills.
    /// Ties break toward a type the primary skill itself carries; an
    /// unbreakable tie resolves to `unknown`.
    fn classify_damage_type(&self, tags: &BuildTags) -> DamageTypeLabel {
        let rules = &self.registry.rules;
        let mut scores: Vec<(DamageType, f64)> = Vec::new();

        let mut add = |ty: DamageType, weight: f64| match scores.iter_mut().find(|(t, _)| *t == ty)
        {
            Some((_, score)) => *score += weight,
            None => scores.push((ty, weight)),
        };

        for &ty in &DamageType::ALL {
            let type_tags = rules.damage_tags_for(ty);
            if tags_intersect(&tags.primary_skill_tags, type_tags) {
                add(ty, PRIMARY_SKILL_WEIGHT);
            }
            for support in &tags.support_tags {
                if tags_intersect(support, type_tags) {
                    add(ty, SUPPORT_SKILL_WEIGHT);
                }
            }
            for secondary in &tags.secondary_skill_tags {
                if tags_intersect(secondary, type_tags) {
                    add(ty, SUPPORT_SKILL_WEIGHT);
                }
            }
        }

        let Some(&(_, best_score)) = scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            return DamageTypeLabel::Unknown;
        };

        let mut leaders: Vec<DamageType> = scores
            .iter()
            .filter(|(_, score)| *score == best_score)
            .map(|(ty, _)| *ty)
            .collect();
        leaders.sort();

        if leaders.len() == 1 {
            return DamageTypeLabel::from_damage_type(leaders[0]);
        }

        // Tie-break: prefer a leader the primary skill tags directly name.
        let primary_leaders: Vec<DamageType> = leaders
            .iter()
            .copied()
            .filter(|&ty| tags_intersect(&tags.primary_skill_tags, rules.damage_tags_for(ty)))
            .collect();
        match primary_leaders.as_slice() {
            [only] => DamageTypeLabel::from_damage_type(*only),
            _ => DamageTypeLabel::Unknown,
        }
    }

    /// Defense style from blended EHP per character level. Raw pools are not
    /// comparable across levels, the per-level ratio is. Incomplete stats
    /// force `unknown` regardless of the threshold math.
    fn classify_defense_style(&self, stats: &AggregatedStats, ehp: &EhpResult) -> DefenseStyle {
        if ehp.incomplete {
            return DefenseStyle::Unknown;
        }
        let per_level = ehp.blended / f64::from(stats.level.max(1));
        let thresholds = self.registry.rules.defense_thresholds;
        if per_level > thresholds.tanky {
            DefenseStyle::Tanky
        } else if per_level >= thresholds.balanced {
            DefenseStyle::Balanced
        } else {
            DefenseStyle::Squishy
        }
    }

    /// Cost tier from the item cost table plus link-count signals. Any
    /// luxury-flagged item forces the luxury tier on its own.
    fn classify_cost_tier(&self, tags: &BuildTags) -> CostTier {
        let table = &self.registry.item_costs;
        let mut score = 0.0;

        for item in &tags.item_names {
            if let Some(entry) = table.lookup(item) {
                if entry.luxury {
                    return CostTier::Luxury;
                }
                score += entry.weight;
            }
        }

        let gem_count = tags.support_tags.len() as u32 + 1;
        if tags.main_links >= 6 || gem_count >= 6 {
            score += table.link_weights.six_link;
        } else if tags.main_links >= 5 || gem_count >= 5 {
            score += table.link_weights.five_link;
        }

        let thresholds = table.thresholds;
        if score >= thresholds.luxury {
            CostTier::Luxury
        } else if score >= thresholds.expensive {
            CostTier::Expensive
        } else if score >= thresholds.moderate {
            CostTier::Moderate
        } else {
            CostTier::Budget
        }
    }

    /// Skill delivery from mechanic tags on the primary skill and its
    /// supports (a totem/trap support converts the delivery). Multiple
    /// candidates resolve through the configured priority order.
    fn classify_skill_delivery(&self, tags: &BuildTags) -> SkillDelivery {
        let rules = &self.registry.rules;
        let mut candidates = rules.mechanics_for_tags(&tags.primary_skill_tags);
        for support in &tags.support_tags {
            for mechanic in rules.mechanics_for_tags(support) {
                if !candidates.contains(&mechanic) {
                    candidates.push(mechanic);
                }
            }
        }
        match rules.highest_priority(&candidates) {
            Some(mechanic) => SkillDelivery::from_mechanic(mechanic),
            None => SkillDelivery::Unknown,
        }
    }
}

fn tags_intersect(skill_tags: &[String], table_tags: &[String]) -> bool {
    table_tags.iter().any(|tag| skill_tags.iter().any(|t| t == tag))
}
