//! File and environment configuration for the harness

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::config::ConfigOverrides;
use crate::error::{Error, Result};
use crate::filter::{Chain, IgnoreRules, MinImpact};
use crate::reporter::{ConsoleReporter, SilentReporter, TracingReporter};
use crate::types::Impact;

/// Environment variable that forces skip-failures on or off
pub const SKIP_FAILURES_ENV: &str = "AXECHECK_SKIP_FAILURES";

/// Which built-in reporter to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterKind {
    #[default]
    Console,
    Tracing,
    Silent,
}

/// Serializable subset of the check configuration, as found in
/// `axecheck.toml`:
///
/// ```toml
/// skip_failures = false
/// fail_on_impact = "serious"
/// ignore_rules = ["region"]
/// reporter = "console"
///
/// [audit_options]
/// runOnly = ["wcag2a", "wcag2aa"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessSettings {
    /// Options forwarded to the engine's run call
    #[serde(default)]
    pub audit_options: Option<Value>,

    #[serde(default)]
    pub skip_failures: Option<bool>,

    /// Only violations at or above this impact fail the check
    #[serde(default)]
    pub fail_on_impact: Option<Impact>,

    /// Rule ids that never fail the check
    #[serde(default)]
    pub ignore_rules: Vec<String>,

    #[serde(default)]
    pub reporter: Option<ReporterKind>,
}

impl HarnessSettings {
    /// Load settings from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `AXECHECK_SKIP_FAILURES` if it is set.
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(SKIP_FAILURES_ENV) {
            self.skip_failures = Some(parse_flag(&raw)?);
        }
        Ok(self)
    }

    /// Turn the settings into a partial configuration.
    /// Fields that are not set stay absent.
    pub fn into_overrides(self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        overrides.audit_options = self.audit_options;
        overrides.skip_failures = self.skip_failures;

        overrides = match (self.fail_on_impact, self.ignore_rules.is_empty()) {
            (Some(impact), true) => overrides.should_fail(MinImpact(impact)),
            (Some(impact), false) => {
                overrides.should_fail(Chain(IgnoreRules::new(self.ignore_rules), MinImpact(impact)))
            }
            (None, false) => overrides.should_fail(IgnoreRules::new(self.ignore_rules)),
            (None, true) => overrides,
        };

        match self.reporter {
            Some(ReporterKind::Console) => overrides.violations_cb(ConsoleReporter::new()),
            Some(ReporterKind::Tracing) => overrides.violations_cb(TracingReporter::default()),
            Some(ReporterKind::Silent) => overrides.violations_cb(SilentReporter),
            None => overrides,
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::InvalidConfig(format!(
            "{} must be a boolean, got '{}'",
            SKIP_FAILURES_ENV, other
        ))),
    }
}
