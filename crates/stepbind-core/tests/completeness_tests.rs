use pretty_assertions::assert_eq;
use stepbind_core::prelude::*;
use stepbind_core::{BindError, OmissionKind};
use stepbind_model::ErrorOptions;
use stepbind_test_utils::{
    outline, scenario, vending_machine_feature, RecordingHost, PAYING_FOR_SNACKS,
    SELECTING_A_SNACK,
};

fn tagged_feature(filter: &str) -> Feature {
    Feature::new("Tagged")
        .with_scenario(scenario("Smoke", 2, &[(StepKeyword::Given, "smoke")]).with_tag("@smoke"))
        .with_scenario(scenario("Slow", 5, &[(StepKeyword::Given, "slow")]).with_tag("@slow"))
        .with_options(Options::new().with_tag_filter(filter))
}

#[test]
fn test_partially_bound_scenario_lists_every_unbound_step() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test(SELECTING_A_SNACK, |steps| {
            steps.given(r#"the machine has "Mars" in stock"#, |_| async { Ok(()) })
        })
    })
    .unwrap_err();

    assert!(err.is_completeness());
    match &err {
        BindError::MissingStepDefinitions { scenario, missing } => {
            assert_eq!(scenario, SELECTING_A_SNACK);
            let indexes: Vec<_> = missing.iter().map(|m| m.index).collect();
            assert_eq!(indexes, vec![2, 3, 4]);
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.starts_with("Scenario \"Selecting a snack\" has 3 step(s) without a step definition."));
    assert!(message.contains("Step #2 \"I insert 2 coins\" is unbound"));
    assert!(host.test_names().is_empty());
}

#[test]
fn test_undefined_scenario_raises_one_aggregate_error() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test(SELECTING_A_SNACK, |steps| {
            steps.given(r#"the machine has "Mars" in stock"#, |_| async { Ok(()) })?;
            steps.when("I insert 2 coins", |_| async { Ok(()) })?;
            steps.and(r#"I select "Mars""#, |_| async { Ok(()) })?;
            steps.then(r#"I receive "Mars""#, |_| async { Ok(()) })
        })
    })
    .unwrap_err();

    match &err {
        BindError::MissingScenarioDefinitions { group, omissions } => {
            assert_eq!(group, "Vending machine");
            assert_eq!(omissions.len(), 1);
            assert_eq!(omissions[0].kind, OmissionKind::Outline);
            assert_eq!(omissions[0].title, PAYING_FOR_SNACKS);
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.starts_with(
        "Scenario \"Paying for snacks\" found in feature file but no step definitions were provided."
    ));
    assert!(message.contains("scenarios.test(\"Paying for snacks\""));
    // the defined scenario was registered before the group closed
    assert_eq!(host.test_names(), vec![SELECTING_A_SNACK]);
}

#[test]
fn test_undefined_scenarios_allowed_when_switched_off() {
    let feature = vending_machine_feature().with_options(Options::new().with_errors(ErrorOptions {
        missing_scenario_in_step_definitions: false,
        ..ErrorOptions::all()
    }));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |_scenarios| Ok(())).unwrap();

    assert_eq!(host.groups(), vec!["Vending machine"]);
    assert!(host.test_names().is_empty());
}

#[test]
fn test_fully_skipped_feature_registers_nothing() {
    let feature = tagged_feature("@regression");
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |_scenarios| {
        panic!("callback must not run when every scenario is skipped")
    })
    .unwrap();

    assert!(host.is_empty());
}

#[test]
fn test_only_active_scenarios_must_be_defined() {
    let feature = tagged_feature("@smoke");
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Smoke", |steps| steps.given("smoke", |_| async { Ok(()) }))
    })
    .unwrap();

    assert_eq!(host.test_names(), vec!["Smoke"]);
}

#[test]
fn test_defining_a_skipped_scenario_is_a_silent_no_op() {
    let feature = tagged_feature("not @slow");
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Smoke", |steps| steps.given("smoke", |_| async { Ok(()) }))?;
        scenarios.test("Slow", |_steps| panic!("skipped scenario callback must not run"))
    })
    .unwrap();

    assert_eq!(host.test_names(), vec!["Smoke"]);
}

#[test]
fn test_feature_tags_take_part_in_filtering() {
    let feature = tagged_feature("@nightly and @slow").with_tag("@nightly");
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Slow", |steps| steps.given("slow", |_| async { Ok(()) }))
    })
    .unwrap();

    assert_eq!(host.test_names(), vec!["Slow"]);
}

#[test]
fn test_outline_instances_are_filtered_individually() {
    let paying = outline(
        "Paying",
        3,
        &[(StepKeyword::Given, "I pay <amount>")],
        &["amount"],
        &[&["1"], &["2"]],
    );
    let mut tagged = paying.clone();
    tagged.scenarios[1] = tagged.scenarios[1].clone().with_tag("@big");
    let feature = Feature::new("Outline filter")
        .with_outline(tagged)
        .with_options(Options::new().with_tag_filter("@big"));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Paying", |steps| {
            assert_eq!(steps.scenario_count(), 1);
            steps.given("I pay 2", |_| async { Ok(()) })
        })
    })
    .unwrap();

    assert_eq!(host.test_names(), vec!["Paying"]);
}

#[test]
fn test_malformed_tag_filter_is_a_configuration_error() {
    let feature = tagged_feature("@smoke and");
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |_scenarios| Ok(())).unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(err, BindError::TagFilter(_)));
    assert!(host.is_empty());
}
