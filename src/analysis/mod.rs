pub mod aggregator;
pub mod categorizer;
pub mod ehp;

pub use aggregator::{aggregate, AggregatedStats, StatCompleteness, DEFAULT_ACCURACY_ASSUMPTION};
pub use categorizer::{
    BuildCategorizer, BuildTags, CategorizedBuild, CategoryLabels, CostTier, DamageTypeLabel,
    DefenseStyle, LabelParseError, SkillDelivery,
};
pub use ehp::{
    compute_ehp, hit_chance, DamageMitigationProfile, DamageType, EhpConfig, EhpResult,
    MAX_TOTAL_REDUCTION,
};
