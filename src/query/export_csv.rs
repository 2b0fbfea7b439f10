//! Flattens a query outcome to CSV for spreadsheet analysis.

use std::fmt;
use std::io::Write;

use crate::analysis::categorizer::CategorizedBuild;
use crate::analysis::ehp::DamageType;

pub const EXPORT_HEADERS: [&str; 14] = [
    "account",
    "character",
    "league",
    "level",
    "class",
    "damage_type",
    "defense_style",
    "cost_tier",
    "skill_delivery",
    "ehp_blended",
    "ehp_physical",
    "ehp_fire",
    "ehp_incomplete",
    "exported_at",
];

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "failed to write CSV row: {err}"),
            Self::Io(err) => write!(f, "failed to flush CSV output: {err}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Write one row per build to `out`. The export stamp is shared by every
/// row of one export so re-imports can group them.
pub fn write_builds_csv<W: Write>(out: W, builds: &[CategorizedBuild]) -> Result<(), ExportError> {
    let exported_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(EXPORT_HEADERS)?;

    for build in builds {
        writer.write_record([
            build.record.account.as_str(),
            build.record.name.as_str(),
            build.record.league.as_str(),
            &build.record.level.to_string(),
            build.record.class_name.as_str(),
            build.labels.damage_type.as_str(),
            build.labels.defense_style.as_str(),
            build.labels.cost_tier.as_str(),
            build.labels.skill_delivery.as_str(),
            &format!("{:.1}", build.ehp.blended),
            &format!("{:.1}", build.ehp.for_type(DamageType::Physical)),
            &format!("{:.1}", build.ehp.for_type(DamageType::Fire)),
            if build.ehp.incomplete { "true" } else { "false" },
            &exported_at,
        ])?;
    }

    writer.flush().map_err(ExportError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::categorizer::BuildCategorizer;
    use crate::data::record::RawBuildRecord;
    use crate::data::registry::RulesRegistry;

    #[test]
    fn export_writes_header_and_one_row_per_build() {
        let record: RawBuildRecord = serde_json::from_str(
            r#"{"account":"a","name":"Char","league":"Standard","level":90,"class":"Witch","life":5000}"#,
        )
        .expect("record parses");
        let build = BuildCategorizer::new(RulesRegistry::builtin()).categorize_record(&record);

        let mut buffer = Vec::new();
        write_builds_csv(&mut buffer, &[build]).expect("export succeeds");

        let text = String::from_utf8(buffer).expect("csv is utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("account,character,league"));
        assert!(lines[1].contains("Char"));
        assert!(lines[1].contains("5000.0"));
    }

    #[test]
    fn empty_result_exports_header_only() {
        let mut buffer = Vec::new();
        write_builds_csv(&mut buffer, &[]).expect("export succeeds");
        let text = String::from_utf8(buffer).expect("csv is utf-8");
        assert_eq!(text.lines().count(), 1);
    }
}
