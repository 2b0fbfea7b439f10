//! Query criteria, validation, and the single shared match predicate.
//!
//! Both query-resolution paths run the predicate in this module, which is
//! what guarantees they can never diverge in filtering semantics. An absent
//! axis always matches; a present axis matches by exact label equality.
//! `unknown` is an ordinary label, not a match failure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::categorizer::{
    CategorizedBuild, CostTier, DamageTypeLabel, DefenseStyle, LabelParseError, SkillDelivery,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    #[serde(default)]
    pub damage_type: Option<DamageTypeLabel>,
    #[serde(default)]
    pub defense_style: Option<DefenseStyle>,
    #[serde(default)]
    pub cost_tier: Option<CostTier>,
    #[serde(default)]
    pub skill_delivery: Option<SkillDelivery>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub min_ehp: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl QueryFilter {
    /// Parse `axis=value` pairs as supplied on a CLI or bot command line.
    /// Unknown axes and out-of-set values are rejected, not ignored.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = QueryFilter::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (axis, value) = pair
                .split_once('=')
                .ok_or_else(|| FilterError::Malformed(pair.to_string()))?;
            match axis {
                "damage_type" => filter.damage_type = Some(value.parse()?),
                "defense_style" => filter.defense_style = Some(value.parse()?),
                "cost_tier" => filter.cost_tier = Some(value.parse()?),
                "skill_delivery" => filter.skill_delivery = Some(value.parse()?),
                "league" => filter.league = Some(value.to_string()),
                "min_ehp" => {
                    filter.min_ehp = Some(value.parse::<f64>().map_err(|_| {
                        FilterError::Malformed(format!("min_ehp '{value}' is not a number"))
                    })?)
                }
                "limit" => {
                    filter.limit = Some(value.parse::<usize>().map_err(|_| {
                        FilterError::Malformed(format!("limit '{value}' is not an integer"))
                    })?)
                }
                other => return Err(FilterError::UnknownAxis(other.to_string())),
            }
        }
        filter.validate()?;
        Ok(filter)
    }

    /// Reject filters no scan should ever start with.
    pub fn validate(&self) -> Result<(), FilterError> {
        if let Some(min_ehp) = self.min_ehp {
            if !min_ehp.is_finite() || min_ehp < 0.0 {
                return Err(FilterError::Malformed(format!(
                    "min_ehp must be a non-negative number, got {min_ehp}"
                )));
            }
        }
        Ok(())
    }

    /// The shared predicate: every result of either resolution path passes
    /// through here.
    pub fn matches(&self, build: &CategorizedBuild) -> bool {
        if let Some(want) = self.damage_type {
            if build.labels.damage_type != want {
                return false;
            }
        }
        if let Some(want) = self.defense_style {
            if build.labels.defense_style != want {
                return false;
            }
        }
        if let Some(want) = self.cost_tier {
            if build.labels.cost_tier != want {
                return false;
            }
        }
        if let Some(want) = self.skill_delivery {
            if build.labels.skill_delivery != want {
                return false;
            }
        }
        if let Some(league) = &self.league {
            if &build.record.league != league {
                return false;
            }
        }
        if let Some(min_ehp) = self.min_ehp {
            if self.sort_ehp(build) < min_ehp {
                return false;
            }
        }
        true
    }

    /// The EHP value both `min_ehp` and result ordering use: the filtered
    /// damage type's EHP when one is requested, the blended EHP otherwise.
    pub fn sort_ehp(&self, build: &CategorizedBuild) -> f64 {
        match self.damage_type.and_then(DamageTypeLabel::damage_type) {
            Some(ty) => build.ehp.for_type(ty),
            None => build.ehp.blended,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Value outside an enumerated label set.
    InvalidLabel(LabelParseError),
    /// Axis name no filter carries.
    UnknownAxis(String),
    /// Structurally broken criterion.
    Malformed(String),
}

impl From<LabelParseError> for FilterError {
    fn from(err: LabelParseError) -> Self {
        Self::InvalidLabel(err)
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLabel(err) => write!(f, "{err}"),
            Self::UnknownAxis(axis) => write!(
                f,
                "unknown filter axis '{axis}' (expected damage_type, defense_style, cost_tier, \
                 skill_delivery, league, min_ehp, limit)"
            ),
            Self::Malformed(detail) => write!(f, "malformed filter: {detail}"),
        }
    }
}

impl std::error::Error for FilterError {}
