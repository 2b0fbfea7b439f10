use serde::Serialize;

use crate::analysis::categorizer::CategorizedBuild;
use crate::data::registry::{rules_dir_from_env, RulesRegistry};
use crate::data::validate::{
    validate_ehp_config, validate_item_costs, validate_rules, ValidationReport,
};
use crate::parallel::WorkerPool;
use crate::query::engine::{QueryEngine, QueryError, QueryOptions};
use crate::query::export_csv::write_builds_csv;
use crate::query::filter::QueryFilter;
use crate::query::source::SnapshotFileSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Query,
    Categorize,
    Popularity,
    Trend,
    Export,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("query") => Some(Command::Query),
        Some("categorize") => Some(Command::Categorize),
        Some("popularity") => Some(Command::Popularity),
        Some("trend") => Some(Command::Trend),
        Some("export") => Some(Command::Export),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Query) => handle_query(args),
        Some(Command::Categorize) => handle_categorize(args),
        Some(Command::Popularity) => handle_popularity(args),
        Some(Command::Trend) => handle_trend(args),
        Some(Command::Export) => handle_export(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("usage: zana <query|categorize|popularity|trend|export|validate>");
            2
        }
    }
}

fn build_engine(snapshot_path: &str) -> Result<QueryEngine<SnapshotFileSource>, i32> {
    let registry = match RulesRegistry::load(&rules_dir_from_env()) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("failed to load rules: {err}");
            return Err(1);
        }
    };
    Ok(QueryEngine::new(
        SnapshotFileSource::new(snapshot_path),
        registry,
    ))
}

fn default_options() -> QueryOptions {
    QueryOptions {
        pool: WorkerPool::from_env(),
        ..QueryOptions::default()
    }
}

fn query_exit_code(err: &QueryError) -> i32 {
    match err {
        QueryError::InvalidFilter(_) => 2,
        QueryError::Source(_) => 1,
    }
}

fn handle_query(args: &[String]) -> i32 {
    let Some(snapshot_path) = args.get(2) else {
        eprintln!("usage: zana query <snapshot.json> [axis=value ...]");
        return 2;
    };
    let filter = match QueryFilter::from_pairs(&args[3..]) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let engine = match build_engine(snapshot_path) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    match engine.query(&filter, &default_options()) {
        Ok(outcome) => print_json(&outcome),
        Err(err) => {
            eprintln!("query failed: {err}");
            query_exit_code(&err)
        }
    }
}

/// One line per build in categorize output: identity, labels, and the
/// human-readable summary the bot/dashboard layers display.
#[derive(Debug, Serialize)]
struct CategorizeLine<'a> {
    account: &'a str,
    character: &'a str,
    level: u32,
    labels: &'a crate::analysis::categorizer::CategoryLabels,
    ehp_blended: f64,
    ehp_incomplete: bool,
    summary: String,
}

impl<'a> CategorizeLine<'a> {
    fn from_build(build: &'a CategorizedBuild) -> Self {
        Self {
            account: &build.record.account,
            character: &build.record.name,
            level: build.record.level,
            labels: &build.labels,
            ehp_blended: build.ehp.blended,
            ehp_incomplete: build.ehp.incomplete,
            summary: build.labels.summary(&build.ehp),
        }
    }
}

fn handle_categorize(args: &[String]) -> i32 {
    let Some(snapshot_path) = args.get(2) else {
        eprintln!("usage: zana categorize <snapshot.json>");
        return 2;
    };
    let engine = match build_engine(snapshot_path) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    match engine.categorize_all(None, &default_options()) {
        Ok((builds, written)) => {
            if written > 0 {
                eprintln!("categorize: wrote labels back for {written} record(s)");
            }
            let lines: Vec<CategorizeLine> =
                builds.iter().map(CategorizeLine::from_build).collect();
            print_json(&lines)
        }
        Err(err) => {
            eprintln!("categorize failed: {err}");
            query_exit_code(&err)
        }
    }
}

fn handle_popularity(args: &[String]) -> i32 {
    let Some(snapshot_path) = args.get(2) else {
        eprintln!("usage: zana popularity <snapshot.json> [axis=value ...]");
        return 2;
    };
    let filter = match QueryFilter::from_pairs(&args[3..]) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let engine = match build_engine(snapshot_path) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    match engine.query(&filter, &default_options()) {
        Ok(outcome) => print_json(&outcome.popularity),
        Err(err) => {
            eprintln!("popularity failed: {err}");
            query_exit_code(&err)
        }
    }
}

/// Label popularity movement between two snapshots of one league, under
/// the same filter.
fn handle_trend(args: &[String]) -> i32 {
    let (Some(before_path), Some(after_path)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: zana trend <before.json> <after.json> [axis=value ...]");
        return 2;
    };
    let filter = match QueryFilter::from_pairs(&args[4..]) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let before_engine = match build_engine(before_path) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let after_engine = match build_engine(after_path) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let options = default_options();
    let before = match before_engine.query(&filter, &options) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("trend failed on '{before_path}': {err}");
            return query_exit_code(&err);
        }
    };
    let after = match after_engine.query(&filter, &options) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("trend failed on '{after_path}': {err}");
            return query_exit_code(&err);
        }
    };
    print_json(&before.popularity.shift_to(&after.popularity))
}

fn handle_export(args: &[String]) -> i32 {
    let (Some(snapshot_path), Some(output_path)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: zana export <snapshot.json> <out.csv> [axis=value ...]");
        return 2;
    };
    let filter = match QueryFilter::from_pairs(&args[4..]) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let engine = match build_engine(snapshot_path) {
        Ok(engine) => engine,
        Err(code) => return code,
    };
    let outcome = match engine.query(&filter, &default_options()) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("export failed: {err}");
            return query_exit_code(&err);
        }
    };
    let file = match std::fs::File::create(output_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("failed to create '{output_path}': {err}");
            return 1;
        }
    };
    match write_builds_csv(file, &outcome.builds) {
        Ok(()) => {
            println!("exported {} build(s) to {output_path}", outcome.builds.len());
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let rules_dir = args
        .get(2)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(rules_dir_from_env);

    let registry = match RulesRegistry::load(&rules_dir) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return 1;
        }
    };

    let mut report = validate_rules(&registry.rules);
    merge_report(&mut report, validate_item_costs(&registry.item_costs));
    merge_report(&mut report, validate_ehp_config(&registry.ehp));

    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    if report.has_errors() {
        eprintln!("validation failed: {} diagnostic(s)", report.diagnostics.len());
        1
    } else {
        println!(
            "validation passed: rules version {}",
            registry.rule_version()
        );
        0
    }
}

fn merge_report(into: &mut ValidationReport, from: ValidationReport) {
    into.diagnostics.extend(from.diagnostics);
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}
