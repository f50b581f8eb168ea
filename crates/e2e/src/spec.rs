//! Declarative YAML test specification

use axecheck_core::HarnessSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,

    /// File the spec was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill {
        selector: String,
        value: String,
        #[serde(default)]
        clear_first: bool,
    },

    /// Press a key
    Press {
        selector: Option<String>,
        key: String,
    },

    /// Wait for an element to appear
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },

    /// Load axe-core into the page
    InjectAxe,

    /// Engine-wide axe options, passed to `axe.configure`
    ConfigureAxe {
        #[serde(default)]
        options: Value,
    },

    /// Update the stored check configuration for the rest of the run
    ConfigureHarness(HarnessSettings),

    /// Audit the page and apply the violation policy
    CheckA11y {
        /// Selector, list, or axe context object; absent, null or `{}`
        /// audits the whole document
        #[serde(default)]
        context: Option<Value>,

        /// Overrides for this check only
        #[serde(default)]
        options: Option<HarnessSettings>,

        #[serde(default)]
        label: Option<String>,
    },
}

impl TestStep {
    /// Short name used in logs and results
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { selector, .. } => format!("click:{}", selector),
            TestStep::Fill { selector, .. } => format!("fill:{}", selector),
            TestStep::Press { key, .. } => format!("press:{}", key),
            TestStep::Wait { selector, .. } => format!("wait:{}", selector),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
            TestStep::InjectAxe => "inject_axe".to_string(),
            TestStep::ConfigureAxe { .. } => "configure_axe".to_string(),
            TestStep::ConfigureHarness(_) => "configure_harness".to_string(),
            TestStep::CheckA11y { label, .. } => match label {
                Some(label) => format!("check_a11y:{}", label),
                None => "check_a11y".to_string(),
            },
        }
    }

    /// Steps that act on the page itself rather than on the audit
    pub fn is_page_step(&self) -> bool {
        matches!(
            self,
            TestStep::Navigate { .. }
                | TestStep::Click { .. }
                | TestStep::Fill { .. }
                | TestStep::Press { .. }
                | TestStep::Wait { .. }
        )
    }
}

fn default_wait_timeout() -> u64 {
    5000 // 5 seconds default
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut spec = Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))?;
        spec.source = Some(path.to_path_buf());
        Ok(spec)
    }

    /// Load all test specs from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Name passed to reporters: the spec file name, or the spec name
    /// when it was not loaded from a file
    pub fn filename(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axecheck_core::Impact;
    use serde_json::json;

    #[test]
    fn test_parse_a11y_spec() {
        let yaml = r#"
name: login-a11y
description: Accessibility of the login flow
tags:
  - a11y
  - smoke
steps:
  - action: navigate
    url: /login
    wait_for_selector: '[data-testid="login-page"]'
  - action: inject_axe
  - action: configure_axe
    options:
      branding:
        application: shop
  - action: check_a11y
  - action: fill
    selector: '#email'
    value: someone@example.com
  - action: check_a11y
    context: form
    label: filled form
    options:
      skip_failures: true
      fail_on_impact: serious
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "login-a11y");
        assert_eq!(spec.steps.len(), 6);

        match &spec.steps[5] {
            TestStep::CheckA11y { context, options, label } => {
                assert_eq!(context.as_ref(), Some(&json!("form")));
                let options = options.as_ref().unwrap();
                assert_eq!(options.skip_failures, Some(true));
                assert_eq!(options.fail_on_impact, Some(Impact::Serious));
                assert_eq!(label.as_deref(), Some("filled form"));
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert!(matches!(spec.steps[3], TestStep::CheckA11y { context: None, .. }));
    }

    #[test]
    fn test_parse_configure_harness() {
        let yaml = r#"
name: tolerant
steps:
  - action: configure_harness
    skip_failures: true
    ignore_rules: [region]
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        match &spec.steps[0] {
            TestStep::ConfigureHarness(settings) => {
                assert_eq!(settings.skip_failures, Some(true));
                assert_eq!(settings.ignore_rules, vec!["region".to_string()]);
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_step_names_and_kinds() {
        let check = TestStep::CheckA11y { context: None, options: None, label: Some("nav".into()) };
        assert_eq!(check.name(), "check_a11y:nav");
        assert!(!check.is_page_step());
        assert!(TestStep::Press { selector: None, key: "Tab".into() }.is_page_step());
    }

    #[test]
    fn test_filename_prefers_source() {
        let mut spec = TestSpec::from_yaml("name: home\nsteps: []\n").unwrap();
        assert_eq!(spec.filename(), "home");
        spec.source = Some(PathBuf::from("specs/home.yaml"));
        assert_eq!(spec.filename(), "home.yaml");
    }
}
