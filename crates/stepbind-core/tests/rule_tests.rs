use pretty_assertions::assert_eq;
use stepbind_core::prelude::*;
use stepbind_core::{BindError, OmissionKind};
use stepbind_test_utils::{scenario, RecordingHost};

fn rules_feature(options: Options) -> Feature {
    Feature::new("Snack machine")
        .with_rule(
            Rule::new("Paying")
                .with_scenario(scenario("Exact change", 3, &[(StepKeyword::Given, "I pay 2 coins")])),
        )
        .with_rule(
            Rule::new("Refilling")
                .with_tag("@staff")
                .with_scenario(scenario("Restock", 7, &[(StepKeyword::Given, "a technician")])),
        )
        .with_options(options)
}

#[test]
fn test_collapsed_rules_are_defined_like_plain_scenarios() {
    let feature = rules_feature(Options::new());
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))?;
        scenarios.test("Restock", |s| s.given("a technician", |_| async { Ok(()) }))
    })
    .unwrap();

    assert_eq!(host.groups(), vec!["Snack machine"]);
    assert_eq!(host.test_names(), vec!["Exact change", "Restock"]);
}

#[test]
fn test_collapsed_rules_keep_their_tags() {
    let feature = rules_feature(Options::new().with_tag_filter("not @staff"));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))
    })
    .unwrap();

    assert_eq!(host.test_names(), vec!["Exact change"]);
}

#[test]
fn test_uncollapsed_rules_open_nested_groups() {
    let feature = rules_feature(Options::new().with_collapse_rules(false));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.rule("Paying", |rule| {
            assert_eq!(rule.title(), "Paying");
            rule.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))
        })?;
        scenarios.rule("refilling", |rule| {
            rule.test("Restock", |s| s.given("a technician", |_| async { Ok(()) }))
        })
    })
    .unwrap();

    assert_eq!(host.groups(), vec!["Snack machine", "Paying", "Refilling"]);
    assert_eq!(
        host.test("Restock").path,
        vec!["Snack machine".to_string(), "Refilling".to_string()]
    );
}

#[test]
fn test_undefined_rule_is_reported_as_omission() {
    let feature = rules_feature(Options::new().with_collapse_rules(false));
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.rule("Paying", |rule| {
            rule.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))
        })
    })
    .unwrap_err();

    match &err {
        BindError::MissingScenarioDefinitions { omissions, .. } => {
            assert_eq!(omissions.len(), 1);
            assert_eq!(omissions[0].kind, OmissionKind::Rule);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "Rule \"Refilling\" found in feature file but no rule definition was provided"
    );
}

#[test]
fn test_rule_based_feature_defines_each_rule() {
    let feature = rules_feature(Options::new());
    let mut host = RecordingHost::new();

    define_rule_based_feature(&mut host, &feature, |rules| {
        assert_eq!(rules.title(), "Snack machine");
        rules.rule("Paying", |rule| {
            rule.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))
        })?;
        rules.rule("Refilling", |rule| {
            rule.test("Restock", |s| s.given("a technician", |_| async { Ok(()) }))
        })
    })
    .unwrap();

    assert_eq!(host.test_names(), vec!["Exact change", "Restock"]);
    assert_eq!(host.groups(), vec!["Snack machine", "Paying", "Refilling"]);
}

#[test]
fn test_rule_based_feature_rejects_unknown_rule() {
    let feature = rules_feature(Options::new());
    let mut host = RecordingHost::new();

    let err = define_rule_based_feature(&mut host, &feature, |rules| {
        rules.rule("Vandalism", |_rule| Ok(()))
    })
    .unwrap_err();

    assert_eq!(err.to_string(), "No matching rule found for 'Vandalism'");
}

#[test]
fn test_rule_skipped_by_its_own_tag_needs_no_definition() {
    let feature = rules_feature(Options::new().with_tag_filter("not @staff"));
    let mut host = RecordingHost::new();

    define_rule_based_feature(&mut host, &feature, |rules| {
        rules.rule("Paying", |rule| {
            rule.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))
        })
    })
    .unwrap();

    assert_eq!(host.groups(), vec!["Snack machine", "Paying"]);
    assert_eq!(host.test_names(), vec!["Exact change"]);
}

#[test]
fn test_feature_tags_do_not_reach_rule_scenarios() {
    let feature = Feature::new("Snack machine")
        .with_tag("@wip")
        .with_rule(
            Rule::new("Paying")
                .with_scenario(scenario("Exact change", 3, &[(StepKeyword::Given, "I pay 2 coins")])),
        )
        .with_options(Options::new().with_collapse_rules(false).with_tag_filter("not @wip"));
    let mut host = RecordingHost::new();

    define_rule_based_feature(&mut host, &feature, |rules| {
        rules.rule("Paying", |rule| {
            rule.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))
        })
    })
    .unwrap();

    assert_eq!(host.groups(), vec!["Snack machine", "Paying"]);
    assert_eq!(host.test_names(), vec!["Exact change"]);
}

#[test]
fn test_defining_a_rule_twice_is_rejected() {
    let feature = rules_feature(Options::new());
    let mut host = RecordingHost::new();

    let err = define_rule_based_feature(&mut host, &feature, |rules| {
        rules.rule("Paying", |rule| {
            rule.test("Exact change", |s| s.given("I pay 2 coins", |_| async { Ok(()) }))
        })?;
        rules.rule("paying", |_rule| panic!("second definition must not run"))
    })
    .unwrap_err();

    assert!(matches!(err, BindError::RuleAlreadyDefined { .. }));
    assert!(err.is_binding_contract());
    assert_eq!(err.to_string(), "Rule \"Paying\" has already been defined");
    assert_eq!(host.test_names(), vec!["Exact change"]);
    assert_eq!(host.groups(), vec!["Snack machine", "Paying"]);
}
