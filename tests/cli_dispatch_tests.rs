use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_zana")
}

fn unique_temp_path(name: &str, ext: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("zana-{name}-{stamp}.{ext}"))
}

fn write_snapshot_fixture(name: &str) -> PathBuf {
    let path = unique_temp_path(name, "json");
    let payload = r#"{
        "league": "Standard",
        "snapshot_id": "s1",
        "fetched_at": "2026-08-01T00:00:00Z",
        "records": [
            {
                "account": "acct",
                "name": "FireTank",
                "league": "Standard",
                "snapshot_id": "s1",
                "level": 95,
                "class": "Marauder",
                "life": 9000,
                "armour": 20000,
                "fire_resistance": 75,
                "main_skill": {"name": "Flameblast", "tags": ["Fire", "Spell"]}
            },
            {
                "account": "acct",
                "name": "GlassCaster",
                "league": "Standard",
                "snapshot_id": "s1",
                "level": 88,
                "class": "Witch",
                "life": 2400,
                "main_skill": {"name": "Ice Nova", "tags": ["Cold", "Spell"]}
            },
            {
                "account": "acct",
                "name": "NoStats",
                "league": "Standard",
                "snapshot_id": "s1",
                "level": 70,
                "class": "Scion"
            }
        ]
    }"#;
    fs::write(&path, payload).expect("fixture should be written");
    path
}

#[test]
fn query_command_dispatches_and_emits_json() {
    let snapshot = write_snapshot_fixture("query");
    let output = Command::new(bin())
        .args(["query", snapshot.to_string_lossy().as_ref()])
        .output()
        .expect("query should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("query should emit json");
    assert_eq!(payload["builds"].as_array().map(Vec::len), Some(3));
    assert_eq!(payload["popularity"]["total"].as_u64(), Some(3));
    assert_eq!(payload["path"].as_str(), Some("fallback"));
    // Highest-EHP build first.
    assert_eq!(payload["builds"][0]["record"]["name"].as_str(), Some("FireTank"));

    let _ = fs::remove_file(snapshot);
}

#[test]
fn query_command_applies_filter_pairs() {
    let snapshot = write_snapshot_fixture("query-filter");
    let output = Command::new(bin())
        .args([
            "query",
            snapshot.to_string_lossy().as_ref(),
            "damage_type=fire",
            "limit=5",
        ])
        .output()
        .expect("query should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("query should emit json");
    let builds = payload["builds"].as_array().expect("builds array");
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0]["labels"]["damage_type"].as_str(), Some("fire"));

    let _ = fs::remove_file(snapshot);
}

#[test]
fn query_command_rejects_bad_filter_with_usage_exit_code() {
    let snapshot = write_snapshot_fixture("query-bad-filter");
    let output = Command::new(bin())
        .args([
            "query",
            snapshot.to_string_lossy().as_ref(),
            "damage_type=holy",
        ])
        .output()
        .expect("query should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("damage_type"));

    let _ = fs::remove_file(snapshot);
}

#[test]
fn query_command_returns_usage_without_snapshot_path() {
    let output = Command::new(bin())
        .arg("query")
        .output()
        .expect("query should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: zana query"));
}

#[test]
fn query_command_fails_cleanly_on_missing_snapshot() {
    let output = Command::new(bin())
        .args(["query", "/nonexistent/zana-snapshot.json"])
        .output()
        .expect("query should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("query failed"));
}

#[test]
fn categorize_command_emits_one_line_per_build() {
    let snapshot = write_snapshot_fixture("categorize");
    let output = Command::new(bin())
        .args(["categorize", snapshot.to_string_lossy().as_ref()])
        .output()
        .expect("categorize should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("categorize should emit json");
    let lines = payload.as_array().expect("array of categorize lines");
    assert_eq!(lines.len(), 3);
    for line in lines {
        assert!(line["character"].is_string());
        assert!(line["labels"]["damage_type"].is_string());
        assert!(line["summary"].is_string());
    }

    let _ = fs::remove_file(snapshot);
}

#[test]
fn popularity_command_emits_axis_counts() {
    let snapshot = write_snapshot_fixture("popularity");
    let output = Command::new(bin())
        .args(["popularity", snapshot.to_string_lossy().as_ref()])
        .output()
        .expect("popularity should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("popularity should emit json");
    assert_eq!(payload["total"].as_u64(), Some(3));
    assert_eq!(payload["damage_type"]["fire"].as_u64(), Some(1));
    assert_eq!(payload["damage_type"]["cold"].as_u64(), Some(1));
    assert_eq!(payload["damage_type"]["unknown"].as_u64(), Some(1));

    let _ = fs::remove_file(snapshot);
}

#[test]
fn trend_command_reports_label_shift_between_snapshots() {
    let before = write_snapshot_fixture("trend-before");
    let after = unique_temp_path("trend-after", "json");
    // Same roster, but the cold caster has respecced into fire.
    fs::write(
        &after,
        r#"{
            "league": "Standard",
            "snapshot_id": "s2",
            "records": [
                {
                    "account": "acct", "name": "FireTank", "league": "Standard",
                    "snapshot_id": "s2", "level": 95, "class": "Marauder",
                    "life": 9000, "armour": 20000, "fire_resistance": 75,
                    "main_skill": {"name": "Flameblast", "tags": ["Fire", "Spell"]}
                },
                {
                    "account": "acct", "name": "GlassCaster", "league": "Standard",
                    "snapshot_id": "s2", "level": 89, "class": "Witch",
                    "life": 2400,
                    "main_skill": {"name": "Fireball", "tags": ["Fire", "Spell"]}
                },
                {
                    "account": "acct", "name": "NoStats", "league": "Standard",
                    "snapshot_id": "s2", "level": 70, "class": "Scion"
                }
            ]
        }"#,
    )
    .expect("fixture should be written");

    let output = Command::new(bin())
        .args([
            "trend",
            before.to_string_lossy().as_ref(),
            after.to_string_lossy().as_ref(),
        ])
        .output()
        .expect("trend should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload: serde_json::Value =
        serde_json::from_str(&stdout).expect("trend should emit json");
    assert_eq!(payload["total_before"].as_u64(), Some(3));
    assert_eq!(payload["total_after"].as_u64(), Some(3));
    assert_eq!(payload["damage_type"]["fire"].as_i64(), Some(1));
    assert_eq!(payload["damage_type"]["cold"].as_i64(), Some(-1));
    assert!(payload["damage_type"].get("unknown").is_none());

    let _ = fs::remove_file(before);
    let _ = fs::remove_file(after);
}

#[test]
fn export_command_writes_csv_with_headers() {
    let snapshot = write_snapshot_fixture("export");
    let out = unique_temp_path("export-out", "csv");
    let output = Command::new(bin())
        .args([
            "export",
            snapshot.to_string_lossy().as_ref(),
            out.to_string_lossy().as_ref(),
        ])
        .output()
        .expect("export should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("exported 3 build(s)"));

    let csv = fs::read_to_string(&out).expect("export file should exist");
    let mut lines = csv.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("account,character,league,level,class"));
    assert_eq!(lines.count(), 3);

    let _ = fs::remove_file(snapshot);
    let _ = fs::remove_file(out);
}

#[test]
fn validate_command_passes_on_builtin_rules() {
    let missing_dir = unique_temp_path("no-rules-dir", "d");
    let output = Command::new(bin())
        .args(["validate", missing_dir.to_string_lossy().as_ref()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validation passed"));
    assert!(stdout.contains("builtin-1+builtin-1+builtin-1"));
}

#[test]
fn validate_command_rejects_malformed_rules_file() {
    let dir = unique_temp_path("bad-rules", "d");
    fs::create_dir_all(&dir).expect("rules dir should be created");
    fs::write(dir.join("categorizer.yaml"), "version: [unclosed").expect("fixture written");

    let output = Command::new(bin())
        .args(["validate", dir.to_string_lossy().as_ref()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validation failed"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn validate_command_rejects_bad_ehp_settings() {
    let dir = unique_temp_path("bad-ehp", "d");
    fs::create_dir_all(&dir).expect("rules dir should be created");
    fs::write(
        dir.join("ehp.yaml"),
        "version: \"v1\"\nstandard_hit: 0.0\nresistance_cap: 75.0\ndamage_weights:\n  - [fire, 1.0]\n",
    )
    .expect("fixture written");

    let output = Command::new(bin())
        .args(["validate", dir.to_string_lossy().as_ref()])
        .output()
        .expect("validate should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("standard_hit") || stderr.contains("standard hit"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unknown_subcommand_returns_usage() {
    let output = Command::new(bin())
        .arg("frobnicate")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: zana"));
}
