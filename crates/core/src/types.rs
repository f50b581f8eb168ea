//! Violation payloads and per-check run results

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One accessibility violation as reported by the audit engine.
///
/// The payload is kept exactly as the engine produced it and forwarded
/// unmodified. The accessors below are lenient: a missing or mistyped field
/// reads as empty instead of failing, so reporters never trip over odd shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violation(Value);

impl Violation {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Rule identifier, e.g. `color-contrast`
    pub fn id(&self) -> &str {
        self.str_field("id")
    }

    /// Raw impact string as the engine wrote it
    pub fn impact_str(&self) -> &str {
        self.str_field("impact")
    }

    pub fn impact(&self) -> Option<Impact> {
        self.impact_str().parse().ok()
    }

    pub fn help(&self) -> &str {
        self.str_field("help")
    }

    pub fn help_url(&self) -> &str {
        self.str_field("helpUrl")
    }

    /// Number of affected page nodes
    pub fn node_count(&self) -> usize {
        self.0
            .get("nodes")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    fn str_field(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

impl From<Value> for Violation {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

/// Severity classification used by axe-core, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Minor => "minor",
            Impact::Moderate => "moderate",
            Impact::Serious => "serious",
            Impact::Critical => "critical",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Impact::Minor),
            "moderate" => Ok(Impact::Moderate),
            "serious" => Ok(Impact::Serious),
            "critical" => Ok(Impact::Critical),
            other => Err(format!("unknown impact: {}", other)),
        }
    }
}

/// What a reporter receives for one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    /// Identifying name of the running test spec
    pub filename: String,

    /// Fail-worthy violations, already filtered
    pub results: Vec<Violation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}
