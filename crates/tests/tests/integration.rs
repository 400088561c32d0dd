//! Integration tests for end-to-end scenario execution.
//!
//! These tests cover the full pipeline:
//! define scenarios -> combine -> register -> run -> export.

use natal_core::ResultSet;
use natal_scenarios::{OverrideDef, ScenarioDef};
use natal_tests::{final_value, series, value_at, TestHarness};

fn baseline_entry() -> ScenarioDef {
    ScenarioDef::new().label("Baseline")
}

/// Doubling injectables initiation from 2003 raises mcpr relative to the
/// baseline, and only from the year after the change.
#[test]
fn initiation_push_raises_mcpr() {
    let mut harness = TestHarness::tiny(1);
    harness.add(baseline_entry()).add(
        ScenarioDef::new()
            .label("Inject push")
            .year(2003)
            .method("Injectables")
            .init_factor(2.0),
    );
    let report = harness.run();
    assert!(report.is_complete());

    let flat = series(&report.results, "Baseline", 0, "mcpr");
    let pushed = series(&report.results, "Inject push", 0, "mcpr");
    assert_eq!(flat.len(), 11);
    // Identical up to and including 2003; the extra uptake is visible from
    // 2004 on.
    for i in 0..4 {
        assert_eq!(flat[i], pushed[i], "year index {i}");
    }
    for i in 4..11 {
        assert!(pushed[i] > flat[i], "year index {i}");
    }
}

/// An efficacy override leaves the mix alone but degrades the failure
/// index at its year.
#[test]
fn efficacy_override_moves_the_failure_index() {
    let mut harness = TestHarness::tiny(1);
    harness.add(baseline_entry()).add(
        ScenarioDef::new()
            .label("Worse pills")
            .year(2005)
            .eff("Pill", 0.5),
    );
    let results = harness.run().results;

    let flat = series(&results, "Baseline", 0, "failure_index");
    let worse = series(&results, "Worse pills", 0, "failure_index");
    for i in 0..5 {
        assert_eq!(flat[i], worse[i]);
    }
    assert!(worse[5] > flat[5]);
    // The mix channels never diverge.
    assert_eq!(
        series(&results, "Baseline", 0, "mcpr"),
        series(&results, "Worse pills", 0, "mcpr")
    );
}

/// A combined scenario carries both operands' edits, each at its own year.
#[test]
fn combined_scenarios_apply_both_changes() {
    let push = ScenarioDef::new()
        .label("Push")
        .year(2003)
        .method("Pill")
        .init_factor(2.0)
        .build()
        .unwrap();
    let worse = ScenarioDef::new()
        .label("Worse")
        .year(2007)
        .eff("Pill", 0.5)
        .build()
        .unwrap();

    let mut harness = TestHarness::tiny(1);
    harness
        .add(baseline_entry())
        .add_scenario(push.clone())
        .add_scenario(push + worse);
    let results = harness.run().results;
    assert_eq!(
        results.scenario_labels(),
        vec!["Baseline", "Push", "Push + Worse"]
    );

    // Before 2007 the combination tracks the push exactly.
    for t in [2004.0, 2006.0] {
        assert_eq!(
            value_at(&results, "Push", 0, t, "failure_index"),
            value_at(&results, "Push + Worse", 0, t, "failure_index"),
        );
    }
    // From 2007 the efficacy edit separates them.
    let push_fi = value_at(&results, "Push", 0, 2007.0, "failure_index").unwrap();
    let both_fi = value_at(&results, "Push + Worse", 0, 2007.0, "failure_index").unwrap();
    assert!(both_fi > push_fi);
    // The push itself is still there.
    assert!(
        final_value(&results, "Push + Worse", "mcpr") > final_value(&results, "Baseline", "mcpr")
    );
}

/// Introducing a method via copy_from adds a share column that is zero for
/// every scenario that never saw the method.
#[test]
fn introduced_methods_appear_in_the_table() {
    let mut harness = TestHarness::tiny(1);
    harness.add(baseline_entry()).add(
        ScenarioDef::new()
            .label("Sayana rollout")
            .year(2004)
            .prob(
                OverrideDef::new()
                    .method("Sayana Press")
                    .copy_from("Injectables"),
            ),
    );
    let results = harness.run().results;

    let column = "share_Sayana Press";
    assert!(results.channel_index(column).is_some());
    assert!(series(&results, "Baseline", 0, column)
        .iter()
        .all(|&v| v == 0.0));
    let rollout = series(&results, "Sayana rollout", 0, column);
    assert!(rollout[..5].iter().all(|&v| v == 0.0));
    assert!(rollout[5] > 0.0);
}

/// The same scenario registered under two labels is two entries producing
/// identical numbers.
#[test]
fn one_scenario_under_two_labels_runs_twice() {
    let scenario = ScenarioDef::new()
        .year(2003)
        .method("Pill")
        .init_factor(1.5)
        .build()
        .unwrap();

    let mut harness = TestHarness::tiny(1);
    harness
        .add_labeled(scenario.clone(), "First")
        .add_labeled(scenario, "Second");
    let results = harness.run().results;

    assert_eq!(results.scenario_labels(), vec!["First", "Second"]);
    assert_eq!(results.len(), 22);
    assert_eq!(
        series(&results, "First", 0, "mcpr"),
        series(&results, "Second", 0, "mcpr")
    );
}

/// Repeats are seeded `seed + k` and, with a deterministic engine, produce
/// identical rows.
#[test]
fn repeats_are_seeded_and_deterministic() {
    let mut harness = TestHarness::tiny(3);
    harness.add(baseline_entry());
    let results = harness.run().results;

    assert_eq!(results.len(), 33);
    let mut seeds: Vec<u64> = results.rows_for("Baseline").map(|r| r.seed).collect();
    seeds.sort_unstable();
    seeds.dedup();
    assert_eq!(seeds, vec![7, 8, 9]);
    let first = series(&results, "Baseline", 0, "mcpr");
    for repeat in 1..3 {
        assert_eq!(series(&results, "Baseline", repeat, "mcpr"), first);
    }
}

/// An age-scoped push moves the aggregate less than the same push applied
/// everywhere.
#[test]
fn age_scoping_limits_the_push() {
    let mut harness = TestHarness::tiny(1);
    harness
        .add(baseline_entry())
        .add(
            ScenarioDef::new()
                .label("Young only")
                .year(2002)
                .method("Pill")
                .init_factor(3.0)
                .ages("15-24"),
        )
        .add(
            ScenarioDef::new()
                .label("Everyone")
                .year(2002)
                .method("Pill")
                .init_factor(3.0),
        );
    let results = harness.run().results;

    let base = final_value(&results, "Baseline", "mcpr");
    let young = final_value(&results, "Young only", "mcpr");
    let everyone = final_value(&results, "Everyone", "mcpr");
    assert!(young > base);
    assert!(everyone > young);
}

/// Exported tables reload with the same shape and values.
#[test]
fn csv_export_round_trips() {
    let mut harness = TestHarness::tiny(2);
    harness.add(baseline_entry()).add(
        ScenarioDef::new()
            .label("Inject push, 2x")
            .year(2003)
            .method("Injectables")
            .init_factor(2.0),
    );
    let results = harness.run().results;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    results.to_csv_path(&path).unwrap();
    let back = ResultSet::from_csv_path(&path).unwrap();

    assert_eq!(back.len(), results.len());
    assert_eq!(back.columns(), results.columns());
    assert_eq!(back, results);
    assert_eq!(
        back.scenario_labels(),
        vec!["Baseline", "Inject push, 2x"]
    );
}

/// Scenario files parse, build, and run exactly as in-code definitions.
#[test]
fn json_scenario_files_run() {
    let json = r#"[
        {"label": "Baseline"},
        {"label": "Better pills", "year": 2005, "eff": {"Pill": 0.995}},
        {
            "label": "Targeted push",
            "year": 2004,
            "probs": [
                {"method": "Injectables", "init_factor": 2.0, "ages": "25-49"},
                {"source": "Pill", "dest": "Injectables", "init_value": 0.08}
            ]
        }
    ]"#;
    let defs: Vec<ScenarioDef> = serde_json::from_str(json).unwrap();

    let mut harness = TestHarness::tiny(1);
    for def in defs {
        harness.add(def);
    }
    let report = harness.run();
    assert!(report.is_complete());
    assert_eq!(
        report.results.scenario_labels(),
        vec!["Baseline", "Better pills", "Targeted push"]
    );
    assert!(
        final_value(&report.results, "Targeted push", "mcpr")
            > final_value(&report.results, "Baseline", "mcpr")
    );
}
