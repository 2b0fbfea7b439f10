//! Rule-table lint: catches table mistakes (negative weights, inverted
//! thresholds, delivery priority gaps) before they silently skew
//! categorization. Diagnostics are severity-tagged; only errors fail the
//! `validate` command.

use std::fmt;

use crate::analysis::ehp::{DamageType, EhpConfig};
use crate::data::items::ItemCostTable;
use crate::data::rules::{CategorizerRules, DeliveryMechanic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Lint a categorizer rule set.
pub fn validate_rules(rules: &CategorizerRules) -> ValidationReport {
    let mut report = ValidationReport::default();

    if rules.version.trim().is_empty() {
        report.push(
            ValidationSeverity::Error,
            "rules.version",
            "version must be non-empty; it keys the categorization cache",
        );
    }

    for entry in &rules.damage_tags {
        if entry.tags.is_empty() {
            report.push(
                ValidationSeverity::Warning,
                format!("damage_tags.{}", entry.damage_type),
                "no tags listed; this damage type can never be scored",
            );
        }
    }

    for entry in &rules.delivery_tags {
        if entry.tags.is_empty() {
            report.push(
                ValidationSeverity::Warning,
                format!("delivery_tags.{}", entry.mechanic.as_str()),
                "no tags listed; this mechanic can never be detected",
            );
        }
    }

    for mechanic in DeliveryMechanic::ALL {
        if !rules.delivery_priority.contains(&mechanic) {
            report.push(
                ValidationSeverity::Error,
                "delivery_priority",
                format!(
                    "mechanic '{}' missing from the priority order; ties involving it cannot be broken",
                    mechanic.as_str()
                ),
            );
        }
    }

    let thresholds = rules.defense_thresholds;
    if thresholds.tanky <= thresholds.balanced {
        report.push(
            ValidationSeverity::Error,
            "defense_thresholds",
            format!(
                "tanky threshold ({}) must exceed balanced threshold ({})",
                thresholds.tanky, thresholds.balanced
            ),
        );
    }

    report
}

/// Lint an item cost table.
pub fn validate_item_costs(table: &ItemCostTable) -> ValidationReport {
    let mut report = ValidationReport::default();

    if table.version.trim().is_empty() {
        report.push(
            ValidationSeverity::Error,
            "item_costs.version",
            "version must be non-empty; it keys the categorization cache",
        );
    }

    for entry in &table.entries {
        if entry.name.trim().is_empty() {
            report.push(
                ValidationSeverity::Error,
                "item_costs.entries",
                "entry with empty name can never match",
            );
        }
        if entry.weight < 0.0 {
            report.push(
                ValidationSeverity::Error,
                format!("item_costs.{}", entry.name),
                format!("negative cost weight {}", entry.weight),
            );
        }
        if entry.luxury && entry.weight < table.thresholds.expensive {
            report.push(
                ValidationSeverity::Info,
                format!("item_costs.{}", entry.name),
                "flagged luxury with a low weight; the override makes the weight moot",
            );
        }
    }

    let t = table.thresholds;
    if !(t.luxury > t.expensive && t.expensive > t.moderate) {
        report.push(
            ValidationSeverity::Error,
            "item_costs.thresholds",
            format!(
                "thresholds must be strictly descending: luxury {} > expensive {} > moderate {}",
                t.luxury, t.expensive, t.moderate
            ),
        );
    }

    if table.link_weights.six_link < table.link_weights.five_link {
        report.push(
            ValidationSeverity::Warning,
            "item_costs.link_weights",
            "six-link weight is below five-link weight",
        );
    }

    report
}

/// Lint the EHP methodology settings.
pub fn validate_ehp_config(config: &EhpConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.version.trim().is_empty() {
        report.push(
            ValidationSeverity::Error,
            "ehp.version",
            "version must be non-empty; it keys the categorization cache",
        );
    }

    if !(config.standard_hit > 0.0) {
        report.push(
            ValidationSeverity::Error,
            "ehp.standard_hit",
            format!("standard hit must be positive, got {}", config.standard_hit),
        );
    }

    if !(config.resistance_cap > 0.0) {
        report.push(
            ValidationSeverity::Error,
            "ehp.resistance_cap",
            format!("resistance cap must be positive, got {}", config.resistance_cap),
        );
    } else if config.resistance_cap >= 100.0 {
        report.push(
            ValidationSeverity::Warning,
            "ehp.resistance_cap",
            format!(
                "resistance cap {} allows full elemental immunity",
                config.resistance_cap
            ),
        );
    }

    for (ty, weight) in &config.damage_weights {
        if *weight < 0.0 {
            report.push(
                ValidationSeverity::Error,
                format!("ehp.damage_weights.{ty}"),
                format!("negative blend weight {weight}"),
            );
        }
    }
    let weight_sum: f64 = config.damage_weights.iter().map(|(_, w)| w.max(0.0)).sum();
    if weight_sum <= 0.0 {
        report.push(
            ValidationSeverity::Error,
            "ehp.damage_weights",
            "all blend weights are zero; blended EHP would always be 0",
        );
    }
    for ty in DamageType::ALL {
        if !config.damage_weights.iter().any(|(t, _)| *t == ty) {
            report.push(
                ValidationSeverity::Info,
                format!("ehp.damage_weights.{ty}"),
                "no blend weight listed; this damage type is excluded from blended EHP",
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::items::ItemCostTable;
    use crate::data::rules::CategorizerRules;

    #[test]
    fn builtin_tables_validate_clean() {
        assert!(!validate_rules(&CategorizerRules::default()).has_errors());
        assert!(!validate_item_costs(&ItemCostTable::default()).has_errors());
        assert!(!validate_ehp_config(&EhpConfig::default()).has_errors());
    }

    #[test]
    fn zero_standard_hit_is_an_error() {
        let config = EhpConfig {
            standard_hit: 0.0,
            ..EhpConfig::default()
        };
        assert!(validate_ehp_config(&config).has_errors());
    }

    #[test]
    fn all_zero_blend_weights_are_an_error() {
        let config = EhpConfig {
            damage_weights: DamageType::ALL.iter().map(|&ty| (ty, 0.0)).collect(),
            ..EhpConfig::default()
        };
        let report = validate_ehp_config(&config);
        assert!(report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.message.contains("blended EHP")));
    }

    #[test]
    fn missing_damage_weight_is_informational_only() {
        let config = EhpConfig {
            damage_weights: vec![(DamageType::Physical, 1.0)],
            ..EhpConfig::default()
        };
        let report = validate_ehp_config(&config);
        assert!(!report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.severity == ValidationSeverity::Info));
    }

    #[test]
    fn missing_priority_entry_is_an_error() {
        let mut rules = CategorizerRules::default();
        rules.delivery_priority.retain(|m| *m != DeliveryMechanic::Bow);
        let report = validate_rules(&rules);
        assert!(report.has_errors());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.message.contains("bow")));
    }

    #[test]
    fn inverted_cost_thresholds_are_an_error() {
        let mut table = ItemCostTable::default();
        table.thresholds.moderate = table.thresholds.luxury + 1.0;
        assert!(validate_item_costs(&table).has_errors());
    }

    #[test]
    fn negative_item_weight_is_an_error() {
        let mut table = ItemCostTable::default();
        table.entries[0].weight = -1.0;
        assert!(validate_item_costs(&table).has_errors());
    }
}
