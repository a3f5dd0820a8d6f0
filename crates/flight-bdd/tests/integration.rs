//! End-to-end runs of feature files against the local search-form fixture.
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test -p flight-bdd --test integration -- --ignored

use flight_bdd::{Feature, Params, RunOptions, Runner, Suite};
use flight_pages::TargetDate;

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

const FEATURE: &str = r#"
feature: Fixture search
params:
  homepage: { required: true }
  weeks: { required: true }
browser:
  headless: true
  date_attempt_timeout_ms: 1000
on_failure:
  retry:
    attempts: 2
    delay_ms: 0
background:
  - Given As an not logged user navigate to homepage ${homepage}
scenarios:
  - name: One-way search
    tags: [smoke, basic_search, one_way]
    steps:
      - When I select one-way trip type
      - And Set as departure airport RTM
      - And Set the arrival Airport MAD
      - And Set the departure time ${weeks} week in the future starting current date
      - And Uncheck the "Check accommodation with booking.com" option
      - And Click the search button
      - Then I am redirected to search results page
  - name: Results without searching
    tags: [regression]
    steps:
      - Then I am redirected to search results page
"#;

/// Fixture URL and a week offset whose target day is selectable there.
fn fixture_params() -> Params {
    // Days 1-3 of each fixture month are disabled.
    let (weeks, target) = (1..=4)
        .map(|w| (w, TargetDate::weeks_from_now(w).unwrap()))
        .find(|(_, t)| t.day() > 3)
        .expect("some week lands after the 3rd");
    let fixture = std::fs::canonicalize(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../flight-pages/tests/fixtures/home.html"
    ))
    .expect("fixture exists");
    let homepage = format!(
        "file://{}?mode=text&date={}",
        fixture.display(),
        target.iso()
    );
    Params::new()
        .set("homepage", homepage)
        .set("weeks", weeks.to_string())
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_t1_suite_passes_on_fixture() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let feature = Feature::parse_with_params(FEATURE, &fixture_params()).unwrap();
    let runner = Runner::new(RunOptions {
        filter: Suite::T1.filter(None).unwrap(),
        ..Default::default()
    })
    .unwrap();

    let result = runner.run(&[feature]).await.unwrap();
    assert_eq!(result.scenarios.len(), 1);
    let scenario = &result.scenarios[0];
    assert!(scenario.success, "error: {:?}", scenario.error);
    assert_eq!(scenario.steps_executed, 8);
    assert_eq!(scenario.retries, 0);
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_failed_assertion_is_retried_and_reported() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let feature = Feature::parse_with_params(FEATURE, &fixture_params()).unwrap();
    let runner = Runner::new(RunOptions {
        filter: Some("regression".parse().unwrap()),
        ..Default::default()
    })
    .unwrap();

    let result = runner.run(&[feature]).await.unwrap();
    assert!(!result.success());
    let scenario = &result.scenarios[0];
    assert_eq!(scenario.retries, 1);
    assert_eq!(scenario.steps_executed, 1);
    let error = scenario.error.as_deref().unwrap_or_default();
    assert!(error.contains("I am redirected to search results page"), "{}", error);
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_parallel_run_keeps_plan_order() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let feature = Feature::parse_with_params(FEATURE, &fixture_params()).unwrap();
    let runner = Runner::new(RunOptions {
        parallel: 2,
        ..Default::default()
    })
    .unwrap();

    let result = runner.run(&[feature]).await.unwrap();
    let names: Vec<_> = result.scenarios.iter().map(|s| s.scenario.as_str()).collect();
    assert_eq!(names, ["One-way search", "Results without searching"]);
    assert_eq!(result.passed(), 1);
    assert_eq!(result.failed(), 1);
}
