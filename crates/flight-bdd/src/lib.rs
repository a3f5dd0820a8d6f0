//! # flight-bdd
//!
//! Scenario runner for the flight search suite. Feature files are YAML,
//! steps are natural-language lines bound to `flight-pages` actions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flight_bdd::{Feature, RunOptions, Runner, Suite};
//!
//! # #[tokio::main]
//! # async fn main() -> flight_bdd::Result<()> {
//! let feature = Feature::load("features/basic_search.yaml")?;
//! let runner = Runner::new(RunOptions {
//!     filter: Suite::T1.filter(None)?,
//!     ..Default::default()
//! })?;
//! let result = runner.run(&[feature]).await?;
//! println!("{} passed, {} failed", result.passed(), result.failed());
//! # Ok(())
//! # }
//! ```

mod feature;
mod runner;
mod steps;
mod tags;

pub use feature::{
    BrowserConfig, Feature, OnFailure, ParamDef, Params, RetryConfig, Scenario, Viewport,
};
pub use runner::{
    stealth_config, PlannedScenario, RunOptions, Runner, ScenarioContext, ScenarioResult, Suite,
    SuiteResult,
};
pub use steps::{compile_pattern, BoundStep, Keyword, Step, StepRegistry, StepText};
pub use tags::TagExpr;

/// Result type for flight-bdd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from loading features or running scenarios.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("{0}")]
    Page(#[from] flight_pages::Error),

    #[error("undefined step: {0}")]
    UndefinedStep(String),

    #[error("invalid tag expression: {0}")]
    TagExpression(String),

    #[error("step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_feature() {
        let yaml = r#"
feature: Basic search
scenarios:
  - name: Search
    steps:
      - Click the search button
"#;
        // Step lines need a keyword.
        assert!(Feature::parse(yaml).is_err());

        let yaml = r#"
feature: Basic search
scenarios:
  - name: Search
    steps:
      - When Click the search button
"#;
        let feature = Feature::parse(yaml).unwrap();
        assert_eq!(feature.name, "Basic search");
        assert_eq!(feature.scenarios.len(), 1);
        assert!(feature.scenarios[0].tags.is_empty());
        assert!(!feature.browser.headless);
        assert_eq!(feature.retry_policy(), (1, 0));
    }

    #[test]
    fn test_parse_browser_config() {
        let yaml = r#"
feature: Test
browser:
  headless: true
  slow_mo_ms: 500
  viewport:
    width: 1280
    height: 720
  proxy: "http://localhost:8080"
  user_agent: "Custom UA"
  timezone: America/New_York
  locale: nl-NL
  timeout_ms: 10000
  date_attempt_timeout_ms: 1500
scenarios:
  - name: One
    steps: ["When Click the search button"]
"#;
        let feature = Feature::parse(yaml).unwrap();
        let b = &feature.browser;
        assert!(b.headless);
        assert_eq!(b.slow_mo_ms, 500);
        assert_eq!(b.viewport.unwrap().width, 1280);
        assert_eq!(b.proxy, Some("http://localhost:8080".into()));
        assert_eq!(b.user_agent, Some("Custom UA".into()));
        assert_eq!(b.timeout_ms, Some(10_000));
        assert_eq!(b.date_attempt_timeout_ms, Some(1_500));

        assert_eq!(b.timezone.as_deref(), Some("America/New_York"));
        assert_eq!(b.locale.as_deref(), Some("nl-NL"));

        let stealth = stealth_config(b, Some(false));
        assert!(!stealth.headless);
        assert_eq!(stealth.viewport_height, 720);
        assert_eq!(stealth.timezone.as_deref(), Some("America/New_York"));
        assert_eq!(stealth.extra_args, ["--lang=nl-NL"]);
    }

    #[test]
    fn test_default_viewport() {
        let stealth = stealth_config(&BrowserConfig::default(), None);
        assert_eq!((stealth.viewport_width, stealth.viewport_height), (1920, 1080));
    }

    #[test]
    fn test_default_timezone_and_locale() {
        let stealth = stealth_config(&BrowserConfig::default(), None);
        assert_eq!(stealth.timezone.as_deref(), Some("Europe/Amsterdam"));
        assert_eq!(stealth.extra_args, ["--lang=en-US"]);
    }

    #[test]
    fn test_parse_steps_and_tags() {
        let yaml = r#"
feature: Basic search
scenarios:
  - name: T1 one-way search
    tags: ["@smoke", basic_search, one_way]
    steps:
      - Given As an not logged user navigate to homepage https://www.kiwi.com/en/
      - When Set as departure airport RTM
      - And Set the arrival Airport MAD
      - Then I am redirected to search results page
"#;
        let feature = Feature::parse(yaml).unwrap();
        let scenario = &feature.scenarios[0];
        assert_eq!(scenario.tags, ["smoke", "basic_search", "one_way"]);
        assert!(scenario.has_tag("one_way"));
        assert_eq!(scenario.steps[2].keyword, Keyword::And);
        assert_eq!(scenario.steps[2].text, "Set the arrival Airport MAD");
    }

    #[test]
    fn test_params_substitution() {
        let yaml = r#"
feature: Search
params:
  origin: RTM
  destination:
    required: true
scenarios:
  - name: Search ${origin}
    steps:
      - When Set as departure airport ${origin}
      - And Set the arrival Airport ${destination}
"#;
        assert!(Feature::parse(yaml)
            .unwrap_err()
            .to_string()
            .contains("destination"));

        let params = Params::new().set("destination", "MAD");
        let feature = Feature::parse_with_params(yaml, &params).unwrap();
        let scenario = &feature.scenarios[0];
        assert_eq!(scenario.name, "Search RTM");
        assert_eq!(scenario.steps[1].text, "Set the arrival Airport MAD");
        assert!(feature.params["destination"].required);
    }

    #[test]
    fn test_parse_on_failure() {
        let yaml = r#"
feature: Test
on_failure:
  retry:
    attempts: 3
    delay_ms: 1000
scenarios:
  - name: One
    steps: ["When Click the search button"]
"#;
        let feature = Feature::parse(yaml).unwrap();
        assert_eq!(feature.retry_policy(), (3, 1000));
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            ("feature: ''\nscenarios: [{name: a, steps: ['When x']}]", "feature name"),
            ("feature: F\nscenarios: []", "no scenarios"),
            ("feature: F\nscenarios: [{name: a, steps: []}]", "no steps"),
            (
                "feature: F\nscenarios: [{name: a, steps: ['When x']}, {name: a, steps: ['When y']}]",
                "duplicate scenario",
            ),
            (
                "feature: F\non_failure: {retry: {attempts: 0}}\nscenarios: [{name: a, steps: ['When x']}]",
                "at least 1",
            ),
        ];
        for (yaml, expected) in cases {
            let err = Feature::parse(yaml).unwrap_err().to_string();
            assert!(err.contains(expected), "{}: {}", expected, err);
        }
    }

    #[test]
    fn test_plan_applies_filter_and_background() {
        let yaml = r#"
feature: Search
background:
  - Given As an not logged user navigate to homepage https://www.kiwi.com/en/
scenarios:
  - name: One way
    tags: [basic_search, one_way]
    steps:
      - When I select one-way trip type
      - And Click the search button
  - name: Return
    tags: [basic_search, return]
    steps:
      - When I select return trip type
"#;
        let feature = Feature::parse(yaml).unwrap();
        let runner = Runner::new(RunOptions {
            filter: Suite::T1.filter(None).unwrap(),
            ..Default::default()
        })
        .unwrap();
        let plan = runner.plan(&[feature]).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].scenario.name, "One way");
        assert_eq!(plan[0].steps.len(), 3);
        assert_eq!(
            plan[0].steps[0].step,
            Step::NavigateHome {
                url: "https://www.kiwi.com/en/".into()
            }
        );
        assert_eq!(plan[0].steps[2].step, Step::ClickSearch);
    }

    #[test]
    fn test_plan_reports_undefined_step() {
        let yaml = r#"
feature: Search
scenarios:
  - name: Broken
    steps:
      - When I book the cheapest flight
"#;
        let feature = Feature::parse(yaml).unwrap();
        let runner = Runner::new(RunOptions::default()).unwrap();
        let err = runner.plan(&[feature]).unwrap_err().to_string();
        assert!(err.contains("Broken"), "{}", err);
        assert!(err.contains("I book the cheapest flight"), "{}", err);
    }

    #[test]
    fn test_load_bundled_features() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../features");
        let files = Feature::discover(dir).unwrap();
        assert!(!files.is_empty());

        let features: Vec<_> = files
            .iter()
            .map(|f| Feature::load(f).unwrap())
            .collect();
        let runner = Runner::new(RunOptions {
            filter: Suite::T1.filter(None).unwrap(),
            ..Default::default()
        })
        .unwrap();
        let plan = runner.plan(&features).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].steps.len(), 8);
    }

    #[test]
    fn test_suite_result_counts() {
        let ok = ScenarioResult {
            feature: "f".into(),
            scenario: "a".into(),
            success: true,
            error: None,
            steps_executed: 3,
            total_steps: 3,
            duration_ms: 10,
            retries: 0,
        };
        let failed = ScenarioResult {
            scenario: "b".into(),
            success: false,
            error: Some("boom".into()),
            ..ok.clone()
        };
        let result = SuiteResult {
            scenarios: vec![ok, failed],
            duration_ms: 20,
        };
        assert_eq!(result.passed(), 1);
        assert_eq!(result.failed(), 1);
        assert!(!result.success());
    }
}
