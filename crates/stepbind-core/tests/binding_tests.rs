use pretty_assertions::assert_eq;
use std::time::Duration;
use stepbind_core::prelude::*;
use stepbind_core::{BindError, TestMode};
use stepbind_model::ErrorOptions;
use stepbind_test_utils::{
    outline, scenario, vending_machine_feature, RecordingHost, PAYING_FOR_SNACKS,
    SELECTING_A_SNACK,
};

fn define_selecting(steps: &mut StepDefiner<'_, '_>) -> BindResult<()> {
    steps.given(r#"the machine has "Mars" in stock"#, |_ctx| async { Ok(()) })?;
    steps.when(StepMatcher::pattern(r"^I insert (\d+) coins$")?, |_ctx| async { Ok(()) })?;
    steps.and(r#"I select "Mars""#, |_ctx| async { Ok(()) })?;
    steps.then(StepMatcher::pattern(r#"^I receive "(.*)"$"#)?, |_ctx| async { Ok(()) })?;
    Ok(())
}

fn define_paying(steps: &mut StepDefiner<'_, '_>) -> BindResult<()> {
    assert_eq!(steps.scenario_count(), 2);
    steps.given(StepMatcher::pattern(r"^the price is (\d+) coins$")?, |_ctx| async { Ok(()) })?;
    steps.when(StepMatcher::pattern(r"^I insert (\d+) coins$")?, |_ctx| async { Ok(()) })?;
    steps.then(StepMatcher::pattern(r"^the machine returns (\d+) coins$")?, |_ctx| async { Ok(()) })?;
    Ok(())
}

#[test]
fn test_feature_registers_one_test_per_concrete_scenario() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        assert_eq!(scenarios.title(), "Vending machine");
        scenarios.test(SELECTING_A_SNACK, define_selecting)?;
        scenarios.test(PAYING_FOR_SNACKS, define_paying)
    })
    .unwrap();

    assert_eq!(host.groups(), vec!["Vending machine"]);
    assert_eq!(
        host.test_names(),
        vec![SELECTING_A_SNACK, PAYING_FOR_SNACKS, PAYING_FOR_SNACKS]
    );
    assert!(host.tests().iter().all(|t| t.path == vec!["Vending machine".to_string()]));
    assert!(host.disabled().is_empty());
}

#[test]
fn test_scenario_titles_match_case_insensitively() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("SELECTING A SNACK", define_selecting)?;
        scenarios.test("paying for snacks", define_paying)
    })
    .unwrap();

    assert_eq!(host.tests().len(), 3);
}

#[test]
fn test_out_of_order_binding_suggests_expected_step() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test(SELECTING_A_SNACK, |steps| {
            steps.when("I insert 2 coins", |_ctx| async { Ok(()) })
        })
    })
    .unwrap_err();

    assert!(err.is_binding_contract());
    let message = err.to_string();
    assert!(message.starts_with(
        "Expected step #1 of scenario \"Selecting a snack\" to match \"the machine has \"Mars\" in stock\""
    ));
    assert!(message.contains("Try adding the following code:"));
    assert!(message.contains("steps.given("));
    assert!(host.test_names().is_empty());
}

#[test]
fn test_matcher_without_matching_step_is_rejected() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test(SELECTING_A_SNACK, |steps| {
            steps.given("the machine is out of order", |_ctx| async { Ok(()) })
        })
    })
    .unwrap_err();

    assert!(matches!(err, BindError::NoMatchingStep { .. }));
}

#[test]
fn test_matcher_hitting_two_steps_is_ambiguous() {
    let feature = Feature::new("Ambiguity").with_scenario(scenario(
        "Two coins",
        2,
        &[
            (StepKeyword::Given, "I insert a coin"),
            (StepKeyword::And, "I insert a coin"),
        ],
    ));
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Two coins", |steps| {
            steps.given("I insert a coin", |_ctx| async { Ok(()) })
        })
    })
    .unwrap_err();

    assert!(matches!(err, BindError::AmbiguousMatcher { .. }));
    assert!(err
        .to_string()
        .contains("More than one step in scenario \"Two coins\" matches"));
}

#[test]
fn test_binding_past_last_step_is_rejected() {
    let feature = Feature::new("Short").with_scenario(scenario(
        "One step",
        2,
        &[(StepKeyword::Given, "a step")],
    ));
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("One step", |steps| {
            steps.given("a step", |_ctx| async { Ok(()) })?;
            steps.then("a step", |_ctx| async { Ok(()) })
        })
    })
    .unwrap_err();

    assert!(matches!(err, BindError::AllStepsDefined { .. }));
}

#[test]
fn test_unknown_scenario_title_is_rejected() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Refilling the machine", |_steps| Ok(()))
    })
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "No scenarios found in feature/rule that match scenario title \"Refilling the machine.\""
    );
}

#[test]
fn test_unknown_scenario_title_ignored_when_switched_off() {
    let feature = vending_machine_feature().with_options(Options::new().with_errors(ErrorOptions {
        missing_scenario_in_feature: false,
        ..ErrorOptions::all()
    }));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Refilling the machine", |_steps| {
            panic!("callback must not run for an unknown scenario")
        })?;
        scenarios.test(SELECTING_A_SNACK, define_selecting)?;
        scenarios.test(PAYING_FOR_SNACKS, define_paying)
    })
    .unwrap();

    assert_eq!(host.tests().len(), 3);
}

#[test]
fn test_defining_a_scenario_twice_is_rejected() {
    let feature = vending_machine_feature();
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test(SELECTING_A_SNACK, define_selecting)?;
        scenarios.test(SELECTING_A_SNACK, define_selecting)
    })
    .unwrap_err();

    assert!(matches!(err, BindError::ScenarioAlreadyDefined { .. }));
}

#[test]
fn test_non_matching_binding_ignored_when_switched_off() {
    let feature = vending_machine_feature().with_options(Options::new().with_errors(ErrorOptions {
        missing_step_in_feature: false,
        ..ErrorOptions::all()
    }));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test(SELECTING_A_SNACK, |steps| {
            steps.given("a step nobody wrote", |_ctx| async { Ok(()) })?;
            define_selecting(steps)
        })?;
        scenarios.test(PAYING_FOR_SNACKS, define_paying)
    })
    .unwrap();

    assert_eq!(host.tests().len(), 3);
}

#[test]
fn test_modes_and_timeouts_reach_the_host() {
    let feature = Feature::new("Modes")
        .with_scenario(scenario("Plain", 2, &[(StepKeyword::Given, "plain")]))
        .with_scenario(scenario("Skipped", 4, &[(StepKeyword::Given, "skipped")]))
        .with_scenario(scenario("Focused", 6, &[(StepKeyword::Given, "focused")]))
        .with_scenario(scenario("Parallel", 8, &[(StepKeyword::Given, "parallel")]))
        .with_scenario(scenario("Slow", 10, &[(StepKeyword::Given, "slow")]));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Plain", |s| s.given("plain", |_| async { Ok(()) }))?;
        scenarios.skip("Skipped", |s| s.given("skipped", |_| async { Ok(()) }))?;
        scenarios.only("Focused", |s| s.given("focused", |_| async { Ok(()) }))?;
        scenarios.concurrent("Parallel", |s| s.given("parallel", |_| async { Ok(()) }))?;
        scenarios.test_with_timeout("Slow", Duration::from_secs(30), |s| {
            s.given("slow", |_| async { Ok(()) })
        })
    })
    .unwrap();

    let modes: Vec<_> = host.tests().iter().map(|t| (t.name.as_str(), t.mode)).collect();
    assert_eq!(
        modes,
        vec![
            ("Plain", TestMode::Normal),
            ("Skipped", TestMode::Skip),
            ("Focused", TestMode::Only),
            ("Parallel", TestMode::Concurrent),
            ("Slow", TestMode::Normal),
        ]
    );
    assert_eq!(host.test("Slow").timeout, Some(Duration::from_secs(30)));
    assert_eq!(host.test("Plain").timeout, None);
}

#[test]
fn test_name_template_receives_group_and_scenario_tags() {
    let feature = Feature::new("Vending machine")
        .with_tag("@machines")
        .with_outline(
            outline(
                "Paying",
                3,
                &[(StepKeyword::Given, "I pay <amount>")],
                &["amount"],
                &[&["1"], &["2"]],
            )
            .with_tag("@payments"),
        )
        .with_options(Options::new().with_scenario_name_template(|vars| {
            Ok(format!(
                "{} > {} [{}] [{}]",
                vars.feature_title,
                vars.scenario_title,
                vars.feature_tags.join(","),
                vars.scenario_tags.join(",")
            ))
        }));
    let mut host = RecordingHost::new();

    define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Paying", |steps| {
            steps.given(StepMatcher::pattern(r"^I pay (\d+)$")?, |_| async { Ok(()) })
        })
    })
    .unwrap();

    assert_eq!(
        host.test_names(),
        vec![
            "Vending machine > Paying [@machines] []",
            "Vending machine > Paying [@machines] []"
        ]
    );
}

#[test]
fn test_failing_name_template_aborts_binding() {
    let feature = vending_machine_feature().with_options(
        Options::new().with_scenario_name_template(|_| anyhow::bail!("template exploded")),
    );
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test(SELECTING_A_SNACK, define_selecting)
    })
    .unwrap_err();

    assert!(err.is_configuration());
    assert!(err.to_string().contains("template exploded"));
    assert!(host.test_names().is_empty());
}

#[test]
fn test_rebinding_a_bound_step_reports_the_next_expected_step() {
    let feature = Feature::new("Rebinding").with_scenario(scenario(
        "Two steps",
        2,
        &[
            (StepKeyword::Given, "a coin"),
            (StepKeyword::Then, "a snack"),
        ],
    ));
    let mut host = RecordingHost::new();

    let err = define_feature(&mut host, &feature, |scenarios| {
        scenarios.test("Two steps", |steps| {
            steps.given("a coin", |_| async { Ok(()) })?;
            steps.given("a coin", |_| async { Ok(()) })
        })
    })
    .unwrap_err();

    match err {
        BindError::OutOfOrder { index, step_text, .. } => {
            assert_eq!(index, 2);
            assert_eq!(step_text, "a snack");
        }
        other => panic!("unexpected error: {other}"),
    }
}
