mod executor;
mod suite;

pub use executor::ScenarioContext;
pub use suite::Suite;

use crate::feature::{BrowserConfig, Feature, Scenario};
use crate::steps::{BoundStep, StepRegistry};
use crate::tags::TagExpr;
use crate::{Error, Result};
use eoka::Browser;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of one scenario, after retries.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub feature: String,
    pub scenario: String,
    pub success: bool,
    /// Error from the last attempt, if it failed.
    pub error: Option<String>,
    /// Steps completed in the last attempt.
    pub steps_executed: usize,
    pub total_steps: usize,
    pub duration_ms: u64,
    pub retries: u32,
}

/// Outcome of a suite run, in planning order.
#[derive(Debug, Default)]
pub struct SuiteResult {
    pub scenarios: Vec<ScenarioResult>,
    pub duration_ms: u64,
}

impl SuiteResult {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.success).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

/// Run-wide overrides.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Overrides every feature's `browser.headless`.
    pub headless: Option<bool>,
    /// Maximum scenarios running at once, each in its own browser.
    pub parallel: usize,
    /// Scenario selection.
    pub filter: Option<TagExpr>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            headless: None,
            parallel: 1,
            filter: None,
        }
    }
}

/// A selected scenario with its steps bound.
#[derive(Debug, Clone)]
pub struct PlannedScenario {
    pub feature: Arc<Feature>,
    pub scenario: Scenario,
    /// Background steps followed by the scenario's own.
    pub steps: Vec<BoundStep>,
}

/// Selects, binds and executes scenarios.
pub struct Runner {
    registry: StepRegistry,
    options: RunOptions,
}

impl Runner {
    pub fn new(options: RunOptions) -> Result<Self> {
        Ok(Self {
            registry: StepRegistry::new()?,
            options,
        })
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Filter scenarios by tag and bind every step. Any undefined step in a
    /// selected scenario fails the whole plan before a browser is launched.
    pub fn plan(&self, features: &[Feature]) -> Result<Vec<PlannedScenario>> {
        let mut planned = Vec::new();
        for feature in features {
            let shared = Arc::new(feature.clone());
            for scenario in &feature.scenarios {
                if let Some(ref filter) = self.options.filter {
                    if !filter.matches(scenario.tags.as_slice()) {
                        debug!("Deselected: {} (tags: {:?})", scenario.name, scenario.tags);
                        continue;
                    }
                }
                let lines: Vec<_> = feature
                    .background
                    .iter()
                    .chain(&scenario.steps)
                    .cloned()
                    .collect();
                let steps = self.registry.bind(&lines).map_err(|e| {
                    Error::Config(format!(
                        "{} / {}: {}",
                        feature.label(),
                        scenario.name,
                        e
                    ))
                })?;
                planned.push(PlannedScenario {
                    feature: Arc::clone(&shared),
                    scenario: scenario.clone(),
                    steps,
                });
            }
        }
        Ok(planned)
    }

    /// Run every selected scenario.
    pub async fn run(&self, features: &[Feature]) -> Result<SuiteResult> {
        let planned = self.plan(features)?;
        if planned.is_empty() {
            warn!("No scenarios selected");
        }
        Ok(self.run_planned(planned).await)
    }

    /// Run already planned scenarios, up to `parallel` at a time.
    pub async fn run_planned(&self, planned: Vec<PlannedScenario>) -> SuiteResult {
        let start = Instant::now();
        let workers = self.options.parallel.max(1);
        info!("Running {} scenario(s), {} at a time", planned.len(), workers);

        let semaphore = Arc::new(Semaphore::new(workers));
        let headless = self.options.headless;
        let local = tokio::task::LocalSet::new();

        let scenarios = local
            .run_until(async move {
                let tasks: Vec<_> = planned
                    .into_iter()
                    .map(|plan| {
                        let semaphore = Arc::clone(&semaphore);
                        let feature = plan.feature.label();
                        let scenario = plan.scenario.name.clone();
                        let total_steps = plan.steps.len();
                        let handle = tokio::task::spawn_local(async move {
                            let _permit = semaphore.acquire_owned().await.ok();
                            run_scenario(&plan, headless).await
                        });
                        ScenarioTask {
                            feature,
                            scenario,
                            total_steps,
                            handle,
                        }
                    })
                    .collect();
                join_in_order(tasks, start).await
            })
            .await;

        SuiteResult {
            scenarios,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// A spawned scenario, with what is needed to report it if the task dies.
struct ScenarioTask {
    feature: String,
    scenario: String,
    total_steps: usize,
    handle: JoinHandle<ScenarioResult>,
}

/// Await every task in order. A panicked or cancelled task becomes a failure.
async fn join_in_order(tasks: Vec<ScenarioTask>, start: Instant) -> Vec<ScenarioResult> {
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                let reason = if e.is_panic() { "panicked" } else { "cancelled" };
                warn!("Scenario '{}' {}: {}", task.scenario, reason, e);
                results.push(ScenarioResult {
                    feature: task.feature,
                    scenario: task.scenario,
                    success: false,
                    error: Some(format!("{}: {}", reason, e)),
                    steps_executed: 0,
                    total_steps: task.total_steps,
                    duration_ms: start.elapsed().as_millis() as u64,
                    retries: 0,
                });
            }
        }
    }
    results
}

/// Timezone used when a feature does not set one.
pub const DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";

/// Locale used when a feature does not set one.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Launch settings for one scenario's browser.
pub fn stealth_config(config: &BrowserConfig, headless: Option<bool>) -> eoka::StealthConfig {
    let viewport = config.viewport.unwrap_or_default();
    let timezone = config.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
    let locale = config.locale.as_deref().unwrap_or(DEFAULT_LOCALE);
    eoka::StealthConfig {
        headless: headless.unwrap_or(config.headless),
        proxy: config.proxy.clone(),
        user_agent: config.user_agent.clone(),
        viewport_width: viewport.width,
        viewport_height: viewport.height,
        timezone: Some(timezone.to_string()),
        extra_args: vec![format!("--lang={}", locale)],
        ..Default::default()
    }
}

async fn run_scenario(plan: &PlannedScenario, headless: Option<bool>) -> ScenarioResult {
    let start = Instant::now();
    let name = plan.scenario.name.clone();
    let (max_attempts, retry_delay) = plan.feature.retry_policy();

    let mut last_error = None;
    let mut last_executed = 0;
    let mut retries = 0;

    info!("Scenario: {}", name);
    for attempt in 1..=max_attempts {
        if attempt > 1 {
            retries += 1;
            info!("Retry attempt {}/{} for '{}'", attempt, max_attempts, name);
            if retry_delay > 0 {
                tokio::time::sleep(Duration::from_millis(retry_delay)).await;
            }
        }

        let (executed, outcome) = run_attempt(plan, headless).await;
        last_executed = executed;
        match outcome {
            Ok(()) => {
                last_error = None;
                break;
            }
            Err(e) => {
                warn!("Attempt {} of '{}' failed: {}", attempt, name, e);
                last_error = Some(e.to_string());
            }
        }
    }

    ScenarioResult {
        feature: plan.feature.label(),
        scenario: name,
        success: last_error.is_none(),
        error: last_error,
        steps_executed: last_executed,
        total_steps: plan.steps.len(),
        duration_ms: start.elapsed().as_millis() as u64,
        retries,
    }
}

/// One attempt in a fresh browser. Returns the number of steps completed.
async fn run_attempt(plan: &PlannedScenario, headless: Option<bool>) -> (usize, Result<()>) {
    let stealth = stealth_config(&plan.feature.browser, headless);
    debug!(
        "Launching browser (headless: {}, viewport: {}x{}, timezone: {:?})",
        stealth.headless, stealth.viewport_width, stealth.viewport_height, stealth.timezone
    );
    let browser = match Browser::launch_with_config(stealth).await {
        Ok(browser) => browser,
        Err(e) => return (0, Err(e.into())),
    };

    let outcome = run_steps(&browser, plan).await;

    if let Err(e) = browser.close().await {
        warn!("Failed to close browser: {}", e);
    }
    outcome
}

async fn run_steps(browser: &Browser, plan: &PlannedScenario) -> (usize, Result<()>) {
    let page = match browser.new_page("about:blank").await {
        Ok(page) => page,
        Err(e) => return (0, Err(e.into())),
    };
    let mut ctx = ScenarioContext::new(&page, &plan.feature.browser);

    for (i, step) in plan.steps.iter().enumerate() {
        info!("  {}", step);
        if let Err(e) = ctx.execute(&step.step).await {
            return (
                i,
                Err(Error::StepFailed {
                    step: step.to_string(),
                    reason: e.to_string(),
                }),
            );
        }
    }
    (plan.steps.len(), Ok(()))
}
