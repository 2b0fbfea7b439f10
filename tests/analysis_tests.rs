use zana::analysis::{
    aggregate, compute_ehp, BuildCategorizer, BuildTags, CostTier, DamageType, DamageTypeLabel,
    DefenseStyle, EhpConfig, SkillDelivery,
};
use zana::data::record::RawBuildRecord;
use zana::data::registry::RulesRegistry;

fn record_json(extra: &str) -> RawBuildRecord {
    let base = r#""account":"acct","name":"Char","league":"Standard","level":90,"class":"Witch""#;
    let raw = if extra.is_empty() {
        format!("{{{base}}}")
    } else {
        format!("{{{base},{extra}}}")
    };
    serde_json::from_str(&raw).expect("fixture record parses")
}

fn approx_eq(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "expected {b}, got {a}");
}

#[test]
fn reference_scenario_armour_halves_the_standard_hit() {
    // life 4000, ES 1000, armour 10000, no resistances, no block:
    // physical reduction 10000/(10000+10000) = 0.5 -> EHP 10000;
    // elemental reduction 0 -> EHP 5000.
    let record = record_json(
        r#""life":4000,"energy_shield":1000,"armour":10000,
           "fire_resistance":0,"cold_resistance":0,"lightning_resistance":0,
           "chaos_resistance":0,"block_chance":0"#,
    );
    let (stats, completeness) = aggregate(&record);
    let ehp = compute_ehp(&stats, completeness, &EhpConfig::default());

    approx_eq(ehp.for_type(DamageType::Physical), 10_000.0, 1e-9);
    approx_eq(ehp.for_type(DamageType::Fire), 5_000.0, 1e-9);
    assert!(!ehp.incomplete);
}

#[test]
fn resistance_over_cap_reduces_exactly_to_the_cap() {
    let record = record_json(r#""life":1000,"fire_resistance":100"#);
    let (stats, completeness) = aggregate(&record);
    let ehp = compute_ehp(&stats, completeness, &EhpConfig::default());
    // Capped at 75%: 1000 / 0.25 = 4000, not infinite.
    approx_eq(ehp.for_type(DamageType::Fire), 4_000.0, 1e-9);
}

#[test]
fn raised_resistance_cap_is_honored() {
    let record = record_json(r#""life":1000,"fire_resistance":90"#);
    let (stats, completeness) = aggregate(&record);
    let config = EhpConfig {
        resistance_cap: 90.0,
        ..EhpConfig::default()
    };
    let ehp = compute_ehp(&stats, completeness, &config);
    approx_eq(ehp.for_type(DamageType::Fire), 10_000.0, 1e-9);
}

#[test]
fn missing_pools_propagate_incomplete_through_to_defense_style() {
    let record = record_json(r#""armour":20000,"fire_resistance":75"#);
    let categorizer = BuildCategorizer::new(RulesRegistry::builtin());
    let build = categorizer.categorize_record(&record);

    assert!(build.ehp.incomplete);
    assert_eq!(build.labels.defense_style, DefenseStyle::Unknown);
    // Other axes still classified independently.
    assert_eq!(build.labels.cost_tier, CostTier::Budget);
}

#[test]
fn full_pipeline_classifies_a_fire_totem_build() {
    let record = record_json(
        r#""life":6500,"energy_shield":500,"armour":8000,
           "fire_resistance":78,"cold_resistance":76,"lightning_resistance":75,
           "chaos_resistance":-20,"block_chance":20,
           "main_skill":{"name":"Flameblast","tags":["Fire","Spell","AoE"]},
           "main_skill_setup":{"links":6,"support_gems":[
               {"name":"Spell Totem Support","tags":["Totem","Support"]},
               {"name":"Elemental Focus Support","tags":["Support"]},
               {"name":"Controlled Destruction Support","tags":["Spell","Support"]}
           ]},
           "skills":[{"name":"Determination","tags":["Aura","Spell"]}],
           "unique_items":[{"name":"Kaom's Heart"},{"name":"Tabula Rasa"}]"#,
    );
    let categorizer = BuildCategorizer::new(RulesRegistry::builtin());
    let build = categorizer.categorize_record(&record);

    assert_eq!(build.labels.damage_type, DamageTypeLabel::Fire);
    assert_eq!(build.labels.skill_delivery, SkillDelivery::Totem);
    // Kaom's 3.0 + Tabula 1.0 + six-link 2.0 = 6.0 -> expensive.
    assert_eq!(build.labels.cost_tier, CostTier::Expensive);
    assert!(!build.ehp.incomplete);
}

#[test]
fn categorization_is_identical_across_repeated_pipeline_runs() {
    let record = record_json(
        r#""life":5000,"armour":5000,"block_chance":30,
           "main_skill":{"name":"Ice Nova","tags":["Cold","Spell"]}"#,
    );
    let categorizer = BuildCategorizer::new(RulesRegistry::builtin());
    let first = categorizer.categorize_record(&record);
    for _ in 0..5 {
        let next = categorizer.categorize_record(&record);
        assert_eq!(next.labels, first.labels);
        assert_eq!(next.ehp, first.ehp);
    }
}

#[test]
fn tag_free_skills_degrade_only_the_tag_driven_axes() {
    let record = record_json(
        r#""life":9500,"main_skill":{"name":"Mystery Skill","tags":[]}"#,
    );
    let categorizer = BuildCategorizer::new(RulesRegistry::builtin());
    let build = categorizer.categorize_record(&record);

    assert_eq!(build.labels.damage_type, DamageTypeLabel::Unknown);
    assert_eq!(build.labels.skill_delivery, SkillDelivery::Unknown);
    assert_eq!(build.labels.defense_style, DefenseStyle::Tanky);
}

#[test]
fn build_tags_extraction_matches_record_contents() {
    let record = record_json(
        r#""main_skill":{"name":"Cyclone","tags":["Melee","Physical"]},
           "main_skill_setup":{"links":5,"support_gems":[{"name":"Brutality","tags":["Physical","Support"]}]},
           "unique_items":[{"name":"Brass Dome"}]"#,
    );
    let tags = BuildTags::from_record(&record);
    assert_eq!(tags.primary_skill_tags, vec!["Melee", "Physical"]);
    assert_eq!(tags.support_tags.len(), 1);
    assert_eq!(tags.item_names, vec!["Brass Dome"]);
    assert_eq!(tags.main_links, 5);
}
