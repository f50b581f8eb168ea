//! Test runner that drives specs through the accessibility check pipeline

use async_trait::async_trait;
use axecheck_core::{
    AuditEngine, AuditOrchestrator, ConfigStore, Error as AuditError, HarnessSettings, Scope,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, PlaywrightEngine};
use crate::spec::{TestSpec, TestStep};

/// A page the runner can drive and audit
#[async_trait]
pub trait PageSession: AuditEngine {
    /// Apply a page step (navigate, click, ...)
    async fn apply(&self, step: &TestStep) -> E2eResult<()>;
}

#[async_trait]
impl PageSession for PlaywrightEngine {
    async fn apply(&self, step: &TestStep) -> E2eResult<()> {
        self.record(step)
    }
}

/// Outcome of one accessibility check step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A11ySummary {
    pub label: Option<String>,

    /// Violations before filtering, unknown when the check failed
    pub raw_count: Option<usize>,

    /// Fail-worthy violations
    pub violations: usize,

    /// Violations found but tolerated by skip_failures
    pub tolerated: bool,
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub a11y: Option<A11ySummary>,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn single(result: TestResult) -> Self {
        Self {
            total: 1,
            passed: if result.success { 1 } else { 0 },
            failed: if result.success { 0 } else { 1 },
            started_at: Utc::now(),
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    }
}

/// Main E2E accessibility runner
pub struct TestRunner {
    /// Playwright configuration
    playwright_config: PlaywrightConfig,

    /// Check configuration shared by every spec in the run
    store: ConfigStore,

    /// Test specs directory
    specs_dir: PathBuf,

    /// Output directory for results
    output_dir: PathBuf,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        let store = ConfigStore::new();
        store.configure(config.settings.into_overrides());

        Self {
            playwright_config: config.playwright,
            store,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Run all tests in the specs directory
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run tests matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let filtered: Vec<TestSpec> = TestSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        self.run_specs(&filtered).await
    }

    /// Run a specific test by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;

        self.run_spec(&spec).await
    }

    /// Run a list of test specs
    pub async fn run_specs(&self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        if specs.is_empty() {
            info!("No specs to run");
        } else {
            PlaywrightEngine::ensure_installed()?;
        }

        info!("Running {} test(s)...", specs.len());

        for spec in specs {
            match self.run_spec(spec).await {
                Ok(result) => {
                    if result.success {
                        passed += 1;
                        info!("✓ {} ({} ms)", result.name, result.duration_ms);
                    } else {
                        failed += 1;
                        error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unknown error"));
                    }
                    results.push(result);
                }
                Err(e) => {
                    failed += 1;
                    error!("✗ {} - {}", spec.name, e);
                    results.push(TestResult {
                        name: spec.name.clone(),
                        success: false,
                        duration_ms: 0,
                        steps: vec![],
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!("Test Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms);

        Ok(TestSuiteResult {
            total: specs.len(),
            passed,
            failed,
            started_at,
            duration_ms,
            results,
        })
    }

    /// Run a single test spec in a fresh Playwright page
    pub async fn run_spec(&self, spec: &TestSpec) -> E2eResult<TestResult> {
        let mut pw_config = self.playwright_config.clone();
        pw_config.viewport_width = spec.viewport.width;
        pw_config.viewport_height = spec.viewport.height;

        let session = Arc::new(PlaywrightEngine::new(pw_config));
        self.run_spec_with(spec, session).await
    }

    /// Run a single test spec against the given page session
    pub async fn run_spec_with<S>(&self, spec: &TestSpec, session: Arc<S>) -> E2eResult<TestResult>
    where
        S: PageSession + 'static,
    {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        let engine: Arc<dyn AuditEngine> = session.clone();
        let orchestrator =
            AuditOrchestrator::new(engine, self.store.clone()).for_spec(spec.filename());

        let mut step_results = Vec::new();
        let mut test_error: Option<String> = None;

        for step in &spec.steps {
            let result = execute_step(&orchestrator, &*session, step).await;

            if !result.success {
                test_error = result.error.clone();
                step_results.push(result);
                break; // Stop on first failure
            }
            step_results.push(result);
        }

        Ok(TestResult {
            name: spec.name.clone(),
            success: test_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps: step_results,
            error: test_error,
        })
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("a11y-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn execute_step<S: PageSession + ?Sized>(
    orchestrator: &AuditOrchestrator,
    session: &S,
    step: &TestStep,
) -> StepResult {
    let start = Instant::now();
    let step_name = step.name();
    debug!("Executing step: {}", step_name);

    let outcome: E2eResult<Option<A11ySummary>> = match step {
        TestStep::Log { message } => {
            info!("[TEST LOG] {}", message);
            Ok(None)
        }
        TestStep::InjectAxe => orchestrator.inject_axe().await.map(|_| None).map_err(E2eError::from),
        TestStep::ConfigureAxe { options } => orchestrator
            .configure_axe(options)
            .await
            .map(|_| None)
            .map_err(E2eError::from),
        TestStep::ConfigureHarness(settings) => {
            orchestrator.configure(settings.clone().into_overrides());
            Ok(None)
        }
        TestStep::CheckA11y { context, options, label } => {
            check_step(orchestrator, context.as_ref(), options.clone(), label.as_deref()).await
        }
        page_step => session.apply(page_step).await.map(|_| None),
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(a11y) => StepResult {
            success: true,
            step_name,
            duration_ms,
            error: None,
            a11y,
        },
        Err(e) => StepResult {
            success: false,
            step_name,
            duration_ms,
            a11y: match &e {
                E2eError::Audit(AuditError::ViolationsDetected { count }) => Some(A11ySummary {
                    label: match step {
                        TestStep::CheckA11y { label, .. } => label.clone(),
                        _ => None,
                    },
                    raw_count: None,
                    violations: *count,
                    tolerated: false,
                }),
                _ => None,
            },
            error: Some(e.to_string()),
        },
    }
}

async fn check_step(
    orchestrator: &AuditOrchestrator,
    context: Option<&serde_json::Value>,
    options: Option<HarnessSettings>,
    label: Option<&str>,
) -> E2eResult<Option<A11ySummary>> {
    let scope = Scope::resolve(context);
    let overrides = options.map(HarnessSettings::into_overrides).unwrap_or_default();

    let report = orchestrator.check_a11y(scope, overrides, label).await?;
    Ok(Some(A11ySummary {
        label: label.map(String::from),
        raw_count: Some(report.raw_count),
        violations: report.violations.len(),
        tolerated: report.tolerated(),
    }))
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,
    pub settings: HarnessSettings,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            settings: HarnessSettings::default(),
            specs_dir: PathBuf::from("tests/a11y/specs"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}
