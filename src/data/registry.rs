//! Startup-loaded rule registry. Load once, pass via Arc to the
//! categorizer, query engine, and CLI so rule files are never re-read per
//! request.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::ehp::EhpConfig;
use crate::data::items::{load_item_costs, ItemCostTable, DEFAULT_ITEMS_FILE};
use crate::data::rules::{load_rules, CategorizerRules, RulesError, DEFAULT_RULES_FILE};

pub const DEFAULT_RULES_DIR: &str = "data/rules";
pub const DEFAULT_EHP_FILE: &str = "ehp.yaml";

/// Immutable bundle of every rule table the pipeline consumes.
#[derive(Debug)]
pub struct RulesRegistry {
    pub rules: CategorizerRules,
    pub item_costs: ItemCostTable,
    pub ehp: EhpConfig,
}

impl RulesRegistry {
    /// Load from `dir`, falling back to compiled-in defaults for any file
    /// that is absent. Present-but-invalid files are hard errors.
    pub fn load(dir: &Path) -> Result<Arc<RulesRegistry>, RulesError> {
        let rules = load_rules(&dir.join(DEFAULT_RULES_FILE))?;
        let item_costs = load_item_costs(&dir.join(DEFAULT_ITEMS_FILE))?;
        let ehp = load_ehp_config(&dir.join(DEFAULT_EHP_FILE))?;
        Ok(Arc::new(RulesRegistry { rules, item_costs, ehp }))
    }

    /// Registry built entirely from compiled-in defaults.
    pub fn builtin() -> Arc<RulesRegistry> {
        Arc::new(RulesRegistry {
            rules: CategorizerRules::default(),
            item_costs: ItemCostTable::default(),
            ehp: EhpConfig::default(),
        })
    }

    /// Combined version of all rule tables. Part of the memoization key:
    /// categorizations computed under a different rule version are never
    /// reused.
    pub fn rule_version(&self) -> String {
        format!(
            "{}+{}+{}",
            self.rules.version, self.item_costs.version, self.ehp.version
        )
    }
}

/// Load the EHP methodology from YAML, or fall back to the compiled-in
/// defaults when the file is missing. A present-but-invalid file is an
/// error, like the other rule tables.
pub fn load_ehp_config(path: &Path) -> Result<EhpConfig, RulesError> {
    if !path.exists() {
        return Ok(EhpConfig::default());
    }
    let raw = fs::read_to_string(path).map_err(RulesError::Read)?;
    let config: EhpConfig = serde_yaml::from_str(&raw).map_err(RulesError::Parse)?;
    Ok(config)
}

/// Rules directory from `ZANA_RULES_DIR`, defaulting to `data/rules`.
pub fn rules_dir_from_env() -> PathBuf {
    std::env::var("ZANA_RULES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_RULES_DIR))
}
