pub mod items;
pub mod record;
pub mod registry;
pub mod rules;
pub mod validate;

pub use items::{ItemCostEntry, ItemCostTable};
pub use record::{
    load_snapshot, BuildSnapshot, MainSkillSetup, RawBuildRecord, RecordKey, SkillGem,
    SnapshotError, UniqueItem,
};
pub use registry::{
    load_ehp_config, rules_dir_from_env, RulesRegistry, DEFAULT_EHP_FILE, DEFAULT_RULES_DIR,
};
pub use rules::{CategorizerRules, DeliveryMechanic, RulesError};
pub use validate::{
    validate_ehp_config, validate_item_costs, validate_rules, ValidationReport,
    ValidationSeverity,
};
