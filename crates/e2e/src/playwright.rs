//! Playwright-backed audit engine
//!
//! Every audit runs as a generated Node script: a fresh page replays the
//! page steps recorded so far, loads axe-core, and prints the violation list
//! on a marker line that is parsed back here.

use async_trait::async_trait;
use axecheck_core::{AuditEngine, ElementRef, Error as AuditError, Scope, Violation};
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::spec::TestStep;

/// Prefix of the stdout line carrying the violations JSON
const VIOLATIONS_MARKER: &str = "__AXECHECK_VIOLATIONS__";

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser: {}", other)),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,

    /// axe-core build loaded into the page
    pub axe_source: PathBuf,

    /// Directory whose `node_modules` provides `playwright`
    pub project_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            axe_source: PathBuf::from("node_modules/axe-core/axe.min.js"),
            project_dir: PathBuf::from("."),
        }
    }
}

/// Audit engine driving axe-core through Playwright
pub struct PlaywrightEngine {
    config: PlaywrightConfig,

    /// Page steps replayed before each audit
    page_steps: Mutex<Vec<TestStep>>,

    /// Resolved axe source, set once injected
    injected: Mutex<Option<PathBuf>>,

    /// Options for `axe.configure`
    engine_options: Mutex<Option<Value>>,
}

impl PlaywrightEngine {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self {
            config,
            page_steps: Mutex::new(Vec::new()),
            injected: Mutex::new(None),
            engine_options: Mutex::new(None),
        }
    }

    /// Check if Playwright is installed
    pub fn ensure_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Record a page step. Non-page steps are rejected.
    pub fn record(&self, step: &TestStep) -> E2eResult<()> {
        if !step.is_page_step() {
            return Err(E2eError::StepFailed {
                step: step.name(),
                reason: "not a page step".to_string(),
            });
        }
        self.page_steps.lock().push(step.clone());
        Ok(())
    }

    pub fn is_injected(&self) -> bool {
        self.injected.lock().is_some()
    }

    /// Build the audit script for `scope`
    pub fn build_script(&self, axe_path: &std::path::Path, scope: &Scope, run_options: &Value) -> String {
        let mut script = String::new();

        // Header
        script.push_str(&format!(r#"
const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            base_url = js_string(&self.config.base_url),
        ));

        for (i, step) in self.page_steps.lock().iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            script.push_str(&step_to_js(step));
            script.push('\n');
        }

        let engine_options = self
            .engine_options
            .lock()
            .clone()
            .unwrap_or(Value::Null);

        script.push_str(&format!(r#"
    // Audit
    await page.addScriptTag({{ path: {axe_path} }});
    const violations = await page.evaluate(async ({{ engineOptions, runOptions }}) => {{
      if (engineOptions) {{
        window.axe.configure(engineOptions);
      }}
      const auditContext = {scope};
      const results = await window.axe.run(auditContext, runOptions);
      return results.violations;
    }}, {{ engineOptions: {engine_options}, runOptions: {run_options} }});
    console.log('{marker}' + JSON.stringify(violations));
"#,
            axe_path = js_string(&axe_path.to_string_lossy()),
            scope = scope_to_js(scope),
            engine_options = engine_options,
            run_options = run_options,
            marker = VIOLATIONS_MARKER,
        ));

        // Footer
        script.push_str(r#"
  } catch (error) {
    console.error(JSON.stringify({ success: false, error: error.message, stack: error.stack }));
    process.exit(1);
  } finally {
    await browser.close();
  }
})();
"#);

        script
    }

    /// Execute a script via node and return its stdout
    async fn run_script(&self, script: &str) -> E2eResult<String> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("audit.js");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let project_dir = std::fs::canonicalize(&self.config.project_dir)?;
        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&project_dir)
            .env("NODE_PATH", project_dir.join("node_modules"))
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(stdout)
    }
}

#[async_trait]
impl AuditEngine for PlaywrightEngine {
    async fn inject(&self) -> axecheck_core::Result<()> {
        if self.is_injected() {
            return Ok(());
        }

        let path = tokio::fs::canonicalize(&self.config.axe_source)
            .await
            .map_err(|e| {
                AuditError::Engine(format!(
                    "axe-core source not found at {}: {}",
                    self.config.axe_source.display(),
                    e
                ))
            })?;
        let source = tokio::fs::read_to_string(&path).await?;
        if source.trim().is_empty() {
            return Err(AuditError::Engine(format!("axe-core source {} is empty", path.display())));
        }

        info!("Injecting axe-core from {}", path.display());
        *self.injected.lock() = Some(path);
        Ok(())
    }

    async fn configure(&self, options: &Value) -> axecheck_core::Result<()> {
        *self.engine_options.lock() = Some(options.clone());
        Ok(())
    }

    async fn run(&self, scope: &Scope, options: &Value) -> axecheck_core::Result<Vec<Violation>> {
        let axe_path = self
            .injected
            .lock()
            .clone()
            .ok_or(AuditError::EngineNotInjected)?;

        let script = self.build_script(&axe_path, scope, options);
        let stdout = self
            .run_script(&script)
            .await
            .map_err(|e| AuditError::Engine(e.to_string()))?;

        parse_violations(&stdout).map_err(|e| AuditError::Engine(e.to_string()))
    }
}

/// Pull the violation list out of the script's stdout
pub fn parse_violations(stdout: &str) -> E2eResult<Vec<Violation>> {
    let pattern = format!(r"(?m)^{}(.*)$", regex::escape(VIOLATIONS_MARKER));
    let re = Regex::new(&pattern).map_err(|e| E2eError::Playwright(e.to_string()))?;

    let captures = re.captures(stdout).ok_or_else(|| {
        E2eError::Playwright("audit script produced no violations line".to_string())
    })?;

    Ok(serde_json::from_str(captures[1].trim_end())?)
}

/// Render a scope as the JS expression handed to `axe.run`
pub fn scope_to_js(scope: &Scope) -> String {
    match scope {
        Scope::WholeDocument => "document".to_string(),
        Scope::Selector(selector) => js_string(selector),
        Scope::Element(element) => element_to_js(element),
        Scope::Elements(items) => {
            let items: Vec<String> = items.iter().map(scope_to_js).collect();
            format!("[{}]", items.join(", "))
        }
        Scope::Context(value) => value.to_string(),
    }
}

fn element_to_js(element: &ElementRef) -> String {
    format!("({})", element.expression())
}

/// JSON string literals are valid JS string literals
fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Convert a page step to JavaScript code
fn step_to_js(step: &TestStep) -> String {
    match step {
        TestStep::Navigate { url, wait_for_selector } => {
            let wait = wait_for_selector
                .as_ref()
                .map(|s| format!("\n    await page.waitForSelector({});", js_string(s)))
                .unwrap_or_default();
            format!("    await page.goto(baseUrl + {});{}", js_string(url), wait)
        }
        TestStep::Click { selector, timeout_ms } => {
            let timeout = timeout_ms.unwrap_or(5000);
            format!("    await page.click({}, {{ timeout: {} }});", js_string(selector), timeout)
        }
        TestStep::Fill { selector, value, clear_first } => {
            let sel = js_string(selector);
            if *clear_first {
                format!(
                    "    await page.fill({sel}, '');\n    await page.fill({sel}, {});",
                    js_string(value)
                )
            } else {
                format!("    await page.fill({}, {});", sel, js_string(value))
            }
        }
        TestStep::Press { selector, key } => match selector {
            Some(sel) => format!(
                "    await page.locator({}).press({});",
                js_string(sel),
                js_string(key)
            ),
            None => format!("    await page.keyboard.press({});", js_string(key)),
        },
        TestStep::Wait { selector, timeout_ms, state } => format!(
            "    await page.waitForSelector({}, {{ state: '{}', timeout: {} }});",
            js_string(selector),
            state.as_str(),
            timeout_ms
        ),
        // audit and log steps never reach the page
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use test_case::test_case;

    fn engine() -> PlaywrightEngine {
        PlaywrightEngine::new(PlaywrightConfig::default())
    }

    #[test_case("chromium", "chromium")]
    #[test_case("firefox", "firefox")]
    #[test_case("webkit", "webkit")]
    fn test_browser_parse(input: &str, expected: &str) {
        assert_eq!(input.parse::<Browser>().unwrap().as_str(), expected);
    }

    #[test]
    fn test_unknown_browser() {
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[test]
    fn test_scope_to_js() {
        assert_eq!(scope_to_js(&Scope::WholeDocument), "document");
        assert_eq!(scope_to_js(&Scope::from("#main")), r##""#main""##);
        assert_eq!(
            scope_to_js(&Scope::Elements(vec![
                Scope::from("nav"),
                Scope::from(ElementRef::new("document.body")),
            ])),
            r#"["nav", (document.body)]"#
        );
        assert_eq!(
            scope_to_js(&Scope::Context(json!({ "exclude": [".ad"] }))),
            r#"{"exclude":[".ad"]}"#
        );
    }

    #[test]
    fn test_resolved_list_renders_items_unchanged() {
        let scope = Scope::resolve(Some(&json!([{}, null, "nav"])));
        assert_eq!(scope_to_js(&scope), r#"[{}, null, "nav"]"#);
    }

    #[test]
    fn test_script_replays_page_steps_then_audits() {
        let engine = engine();
        engine
            .record(&TestStep::Navigate { url: "/cart".into(), wait_for_selector: None })
            .unwrap();
        engine
            .record(&TestStep::Click { selector: "#checkout".into(), timeout_ms: None })
            .unwrap();

        let script = engine.build_script(
            Path::new("/opt/axe.min.js"),
            &Scope::from("main"),
            &json!({ "runOnly": ["wcag2a"] }),
        );

        let goto = script.find(r#"page.goto(baseUrl + "/cart")"#).unwrap();
        let click = script.find(r##"page.click("#checkout", { timeout: 5000 })"##).unwrap();
        let inject = script.find(r#"addScriptTag({ path: "/opt/axe.min.js" })"#).unwrap();
        assert!(goto < click && click < inject);
        assert!(script.contains(r#"const auditContext = "main";"#));
        assert!(script.contains(r#"runOptions: {"runOnly":["wcag2a"]}"#));
        assert!(script.contains("engineOptions: null"));
    }

    #[test_case(true, "launch({ headless: true })")]
    #[test_case(false, "launch({ headless: false })")]
    fn test_launch_honours_headless(headless: bool, expected: &str) {
        let engine = PlaywrightEngine::new(PlaywrightConfig {
            headless,
            ..Default::default()
        });
        let script = engine.build_script(Path::new("/opt/axe.min.js"), &Scope::WholeDocument, &json!({}));
        assert!(script.contains(expected));
    }

    #[test]
    fn test_selectors_are_escaped() {
        let js = step_to_js(&TestStep::Fill {
            selector: "input[name='q']".into(),
            value: "it's \"quoted\"".into(),
            clear_first: false,
        });
        assert_eq!(js, r#"    await page.fill("input[name='q']", "it's \"quoted\"");"#);
    }

    #[test]
    fn test_record_rejects_audit_steps() {
        assert!(engine().record(&TestStep::InjectAxe).is_err());
    }

    #[test]
    fn test_parse_violations() {
        let stdout = "some log\n__AXECHECK_VIOLATIONS__[{\"id\":\"image-alt\",\"nodes\":[{}]}]\n";
        let violations = parse_violations(stdout).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].id(), "image-alt");

        assert!(parse_violations("__AXECHECK_VIOLATIONS__[]").unwrap().is_empty());
        assert!(parse_violations("nothing here").is_err());
    }

    #[tokio::test]
    async fn test_run_before_inject_fails() {
        let err = engine()
            .run(&Scope::WholeDocument, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::EngineNotInjected));
    }

    #[tokio::test]
    async fn test_inject_reads_source_once() {
        let dir = tempfile::tempdir().unwrap();
        let axe = dir.path().join("axe.min.js");
        std::fs::write(&axe, "window.axe = {};").unwrap();

        let engine = PlaywrightEngine::new(PlaywrightConfig {
            axe_source: axe.clone(),
            ..Default::default()
        });
        engine.inject().await.unwrap();
        assert!(engine.is_injected());

        // already injected: the file is not read again
        std::fs::remove_file(&axe).unwrap();
        engine.inject().await.unwrap();
    }

    #[tokio::test]
    async fn test_inject_missing_source() {
        let engine = PlaywrightEngine::new(PlaywrightConfig {
            axe_source: PathBuf::from("/nonexistent/axe.min.js"),
            ..Default::default()
        });
        let err = engine.inject().await.unwrap_err();
        assert!(err.to_string().contains("axe-core source not found"));
        assert!(!engine.is_injected());
    }
}
