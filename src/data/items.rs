//! Item cost table: maps known unique items to cost weights.
//!
//! The table is data, not code. Lookup is case-insensitive substring match
//! because upstream item names are display strings with inconsistent
//! prefixes ("The Brass Dome" vs "Brass Dome").

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::rules::RulesError;

pub const DEFAULT_ITEMS_FILE: &str = "item_costs.yaml";

/// One priced unique item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCostEntry {
    pub name: String,
    pub weight: f64,
    /// Mirror-tier items dominate the cost judgment on their own: any
    /// single luxury item forces the luxury tier regardless of score.
    #[serde(default)]
    pub luxury: bool,
}

/// Score thresholds mapping an aggregate cost score to a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostThresholds {
    pub luxury: f64,
    pub expensive: f64,
    pub moderate: f64,
}

impl Default for CostThresholds {
    fn default() -> Self {
        Self { luxury: 8.0, expensive: 4.0, moderate: 2.0 }
    }
}

/// Extra score from the main skill's link count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkWeights {
    pub five_link: f64,
    pub six_link: f64,
}

impl Default for LinkWeights {
    fn default() -> Self {
        Self { five_link: 1.0, six_link: 2.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCostTable {
    pub version: String,
    pub entries: Vec<ItemCostEntry>,
    pub thresholds: CostThresholds,
    pub link_weights: LinkWeights,
}

impl Default for ItemCostTable {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            entries: default_entries(),
            thresholds: CostThresholds::default(),
            link_weights: LinkWeights::default(),
        }
    }
}

impl ItemCostTable {
    /// Match an equipped item name against the table. First match wins;
    /// entries are checked in table order.
    pub fn lookup(&self, item_name: &str) -> Option<&ItemCostEntry> {
        let lowered = item_name.to_lowercase();
        self.entries
            .iter()
            .find(|entry| lowered.contains(&entry.name.to_lowercase()))
    }
}

fn entry(name: &str, weight: f64, luxury: bool) -> ItemCostEntry {
    ItemCostEntry { name: name.to_string(), weight, luxury }
}

fn default_entries() -> Vec<ItemCostEntry> {
    vec![
        // Build-enabling chase items.
        entry("Mageblood", 5.0, true),
        entry("Headhunter", 5.0, true),
        entry("Mirror of Kalandra", 5.0, true),
        entry("Shavronne's Wrappings", 5.0, true),
        entry("Aegis Aurora", 5.0, true),
        // Expensive but accessible.
        entry("Belly of the Beast", 3.0, false),
        entry("Kaom's Heart", 3.0, false),
        entry("Inpulsa's Broken Heart", 3.0, false),
        entry("Brass Dome", 3.0, false),
        entry("The Baron", 3.0, false),
        entry("Mon'tregul's Grasp", 3.0, false),
        // Common build uniques.
        entry("Tabula Rasa", 1.0, false),
        entry("Goldrim", 1.0, false),
        entry("Wanderlust", 1.0, false),
        entry("Meginord's Girdle", 1.0, false),
        entry("Lycosidae", 1.0, false),
    ]
}

/// Load the cost table from YAML, or fall back to the compiled-in defaults
/// when the file is missing.
pub fn load_item_costs(path: &Path) -> Result<ItemCostTable, RulesError> {
    if !path.exists() {
        return Ok(ItemCostTable::default());
    }
    let raw = fs::read_to_string(path).map_err(RulesError::Read)?;
    let table: ItemCostTable = serde_yaml::from_str(&raw).map_err(RulesError::Parse)?;
    Ok(table)
}
