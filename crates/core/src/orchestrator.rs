//! The accessibility check pipeline

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{ConfigOverrides, ConfigStore};
use crate::engine::AuditEngine;
use crate::error::{Error, Result};
use crate::filter;
use crate::scope::Scope;
use crate::types::{RunResults, Violation};

/// Where a check is in its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStage {
    Idle,
    ScopeResolved,
    ConfigMerged,
    AuditRan,
    Filtered,
    Reported,
    Passed,
    Failed,
    Errored,
}

impl fmt::Display for CheckStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckStage::Idle => "idle",
            CheckStage::ScopeResolved => "scope_resolved",
            CheckStage::ConfigMerged => "config_merged",
            CheckStage::AuditRan => "audit_ran",
            CheckStage::Filtered => "filtered",
            CheckStage::Reported => "reported",
            CheckStage::Passed => "passed",
            CheckStage::Failed => "failed",
            CheckStage::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Summary of a check that did not fail
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Violations returned by the engine before filtering
    pub raw_count: usize,

    /// Fail-worthy violations after filtering
    pub violations: Vec<Violation>,

    /// Whether the reporter was called
    pub reported: bool,
}

impl CheckReport {
    /// Violations were found but skip-failures let the check pass
    pub fn tolerated(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// `"{n} accessibility violation(s) was/were detected"`
pub fn violation_message(count: usize) -> String {
    let one = count == 1;
    format!(
        "{} accessibility violation{} {} detected",
        count,
        if one { "" } else { "s" },
        if one { "was" } else { "were" }
    )
}

/// Fail when any violation is present.
pub fn assert_violations(violations: &[Violation]) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::ViolationsDetected {
            count: violations.len(),
        })
    }
}

/// Runs accessibility checks for one test spec.
pub struct AuditOrchestrator {
    engine: Arc<dyn AuditEngine>,
    store: ConfigStore,
    spec_name: String,
}

impl AuditOrchestrator {
    pub fn new(engine: Arc<dyn AuditEngine>, store: ConfigStore) -> Self {
        Self {
            engine,
            store,
            spec_name: String::new(),
        }
    }

    /// Orchestrator bound to the process-wide configuration store
    pub fn with_shared_store(engine: Arc<dyn AuditEngine>) -> Self {
        Self::new(engine, ConfigStore::shared().clone())
    }

    /// Name reported as `filename` in run results
    pub fn for_spec(mut self, name: impl Into<String>) -> Self {
        self.spec_name = name.into();
        self
    }

    pub fn spec_name(&self) -> &str {
        &self.spec_name
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn engine(&self) -> &Arc<dyn AuditEngine> {
        &self.engine
    }

    pub async fn inject_axe(&self) -> Result<()> {
        self.engine.inject().await
    }

    pub async fn configure_axe(&self, options: &Value) -> Result<()> {
        self.engine.configure(options).await
    }

    /// Update the stored configuration for every later check
    pub fn configure(&self, partial: ConfigOverrides) {
        self.store.configure(partial);
    }

    /// Audit `context` and apply the violation policy.
    ///
    /// `overrides` apply to this call only. Returns
    /// [`Error::ViolationsDetected`] when fail-worthy violations exist and
    /// skip-failures is off; engine and custom reporter errors propagate
    /// unchanged.
    pub async fn check_a11y(
        &self,
        context: impl Into<Scope>,
        overrides: ConfigOverrides,
        label: Option<&str>,
    ) -> Result<CheckReport> {
        let scope = context.into();
        debug!(stage = %CheckStage::ScopeResolved, ?scope, "a11y check");

        let config = self.store.snapshot().merged(&overrides);
        debug!(stage = %CheckStage::ConfigMerged, skip_failures = config.skip_failures, "a11y check");

        let raw = match self.engine.run(&scope, &config.audit_options).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(stage = %CheckStage::Errored, error = %e, "a11y check");
                return Err(e);
            }
        };
        debug!(stage = %CheckStage::AuditRan, violations = raw.len(), "a11y check");

        let failable = filter::apply(config.should_fail.as_ref(), &raw);
        debug!(stage = %CheckStage::Filtered, failable = failable.len(), "a11y check");

        let mut reported = false;
        if !failable.is_empty() {
            let run_results = RunResults {
                filename: self.spec_name.clone(),
                results: failable.clone(),
                label: label.map(String::from),
            };
            config.violations_cb.report(&run_results).map_err(Error::Reporter)?;
            reported = true;
            debug!(stage = %CheckStage::Reported, "a11y check");
        }

        if !config.skip_failures {
            if let Err(e) = assert_violations(&failable) {
                debug!(stage = %CheckStage::Failed, "a11y check");
                return Err(e);
            }
        } else if !failable.is_empty() {
            info!(
                "skip_failures: tolerating {} violation(s) in {}",
                failable.len(),
                self.spec_name
            );
        }

        debug!(stage = %CheckStage::Passed, "a11y check");
        Ok(CheckReport {
            raw_count: raw.len(),
            violations: failable,
            reported,
        })
    }
}
