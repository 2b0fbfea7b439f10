//! Raw character records as received from the collaborator store
//! (ladder snapshots). Immutable inputs to the analysis pipeline.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One active skill gem with its tag set as reported upstream
/// (e.g. "Fire", "Spell", "Totem").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGem {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The main skill's link setup: the supports socketed with it and the
/// link count of the hosting item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainSkillSetup {
    #[serde(default)]
    pub links: u32,
    #[serde(default)]
    pub support_gems: Vec<SkillGem>,
}

/// One equipped unique item, identified by its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueItem {
    pub name: String,
}

/// One character snapshot from the ladder. All stat fields are nullable
/// because upstream data is unverified third-party exports; the aggregator
/// owns the defaulting rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBuildRecord {
    pub account: String,
    pub name: String,
    pub league: String,
    #[serde(default)]
    pub snapshot_id: String,
    pub level: u32,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub ascendancy: Option<String>,

    #[serde(default)]
    pub life: Option<f64>,
    #[serde(default)]
    pub energy_shield: Option<f64>,
    #[serde(default)]
    pub dps: Option<f64>,
    #[serde(default)]
    pub armour: Option<f64>,
    #[serde(default)]
    pub evasion: Option<f64>,
    #[serde(default)]
    pub fire_resistance: Option<f64>,
    #[serde(default)]
    pub cold_resistance: Option<f64>,
    #[serde(default)]
    pub lightning_resistance: Option<f64>,
    #[serde(default)]
    pub chaos_resistance: Option<f64>,
    #[serde(default)]
    pub block_chance: Option<f64>,

    #[serde(default)]
    pub main_skill: Option<SkillGem>,
    #[serde(default)]
    pub skills: Vec<SkillGem>,
    #[serde(default)]
    pub main_skill_setup: Option<MainSkillSetup>,
    #[serde(default)]
    pub unique_items: Vec<UniqueItem>,
}

impl RawBuildRecord {
    /// Stable identity used for cache keying and ordering tie-breaks.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            account: self.account.clone(),
            name: self.name.clone(),
            league: self.league.clone(),
            snapshot_id: self.snapshot_id.clone(),
        }
    }
}

/// Identity of a record: (account, character, league, snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub account: String,
    pub name: String,
    pub league: String,
    pub snapshot_id: String,
}

/// One stored ladder snapshot file: league scope plus the records it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSnapshot {
    pub league: String,
    #[serde(default)]
    pub snapshot_id: String,
    /// RFC 3339 stamp written by the collector.
    #[serde(default)]
    pub fetched_at: Option<String>,
    pub records: Vec<RawBuildRecord>,
}

/// Snapshot envelope with records kept as raw JSON so one malformed
/// record can be skipped without discarding the rest of the file.
#[derive(Debug, Deserialize)]
struct LooseSnapshot {
    league: String,
    #[serde(default)]
    snapshot_id: String,
    #[serde(default)]
    fetched_at: Option<String>,
    records: Vec<serde_json::Value>,
}

/// Load a snapshot file from disk. A record that fails to deserialize is
/// skipped with a warning; only a broken envelope is an error.
pub fn load_snapshot(path: &Path) -> Result<BuildSnapshot, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(SnapshotError::Read)?;
    let loose: LooseSnapshot = serde_json::from_str(&raw).map_err(SnapshotError::Parse)?;

    let total = loose.records.len();
    let records: Vec<RawBuildRecord> = loose
        .records
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    let skipped = total - records.len();
    if skipped > 0 {
        eprintln!(
            "snapshot '{}': skipped {skipped} malformed record(s) of {total}",
            path.display()
        );
    }

    Ok(BuildSnapshot {
        league: loose.league,
        snapshot_id: loose.snapshot_id,
        fetched_at: loose.fetched_at,
        records,
    })
}

#[derive(Debug)]
pub enum SnapshotError {
    Read(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read snapshot file: {err}"),
            Self::Parse(err) => write!(f, "failed to parse snapshot JSON: {err}"),
        }
    }
}

impl std::error::Error for SnapshotError {}
