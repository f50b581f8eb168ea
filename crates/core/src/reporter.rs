//! Reporting fail-worthy violations
//!
//! A reporter is only ever called with a non-empty result set. The built-in
//! reporters never fail; errors from a custom reporter are propagated out of
//! the check unchanged.

use parking_lot::Mutex;
use std::io::Write;
use tracing::{warn, Level};

use crate::types::{RunResults, Violation};

pub trait ViolationReporter: Send + Sync {
    fn report(&self, results: &RunResults) -> anyhow::Result<()>;
}

impl<F> ViolationReporter for F
where
    F: Fn(&RunResults) -> anyhow::Result<()> + Send + Sync,
{
    fn report(&self, results: &RunResults) -> anyhow::Result<()> {
        self(results)
    }
}

/// Plain-text reporter writing to the diagnostic stream (stderr by default).
pub struct ConsoleReporter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::with_writer(std::io::stderr())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Render a result set. Missing fields render as empty strings.
    pub fn render(results: &RunResults) -> String {
        if results.results.is_empty() {
            return String::new();
        }

        let count = results.results.len();
        let mut text = format!(
            "{} accessibility violation{} detected in {}",
            count,
            if count == 1 { "" } else { "s" },
            results.filename
        );
        if let Some(label) = &results.label {
            text.push_str(&format!(" [{}]", label));
        }
        text.push('\n');

        for violation in &results.results {
            text.push_str(&render_line(violation));
            text.push('\n');
        }
        text
    }
}

fn render_line(violation: &Violation) -> String {
    let nodes = violation.node_count();
    format!(
        "  - {} ({}): {} [{} node{}]",
        violation.id(),
        violation.impact_str(),
        violation.help(),
        nodes,
        if nodes == 1 { "" } else { "s" }
    )
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViolationReporter for ConsoleReporter {
    fn report(&self, results: &RunResults) -> anyhow::Result<()> {
        let text = Self::render(results);
        if text.is_empty() {
            return Ok(());
        }

        let mut out = self.out.lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            warn!("Failed to write accessibility report: {}", e);
        }
        Ok(())
    }
}

/// Emits one structured event per violation.
#[derive(Debug, Clone, Copy)]
pub struct TracingReporter {
    level: Level,
}

impl TracingReporter {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for TracingReporter {
    fn default() -> Self {
        Self::new(Level::WARN)
    }
}

impl ViolationReporter for TracingReporter {
    fn report(&self, results: &RunResults) -> anyhow::Result<()> {
        let label = results.label.as_deref().unwrap_or("");
        for v in &results.results {
            // tracing needs the level at compile time
            if self.level == Level::ERROR {
                tracing::error!(spec = %results.filename, label, rule = v.id(), impact = v.impact_str(), nodes = v.node_count(), "{}", v.help());
            } else if self.level == Level::WARN {
                tracing::warn!(spec = %results.filename, label, rule = v.id(), impact = v.impact_str(), nodes = v.node_count(), "{}", v.help());
            } else if self.level == Level::INFO {
                tracing::info!(spec = %results.filename, label, rule = v.id(), impact = v.impact_str(), nodes = v.node_count(), "{}", v.help());
            } else {
                tracing::debug!(spec = %results.filename, label, rule = v.id(), impact = v.impact_str(), nodes = v.node_count(), "{}", v.help());
            }
        }
        Ok(())
    }
}

/// Swallows reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ViolationReporter for SilentReporter {
    fn report(&self, _results: &RunResults) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps every report in memory, for inspecting violations from code.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<RunResults>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<RunResults> {
        self.reports.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    pub fn clear(&self) {
        self.reports.lock().clear();
    }
}

impl ViolationReporter for CollectingReporter {
    fn report(&self, results: &RunResults) -> anyhow::Result<()> {
        self.reports.lock().push(results.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use test_case::test_case;

    /// Writer that shares its buffer with the test
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Writer whose output end has gone away
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a subscriber that records every event as plain text
    fn capture_logs(f: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let logs = buf.0.lock().clone();
        String::from_utf8(logs).unwrap()
    }

    fn results(violations: Vec<serde_json::Value>, label: Option<&str>) -> RunResults {
        RunResults {
            filename: "home.yaml".to_string(),
            results: violations.into_iter().map(Violation::new).collect(),
            label: label.map(String::from),
        }
    }

    #[test]
    fn test_render_lists_each_violation() {
        let text = ConsoleReporter::render(&results(
            vec![
                json!({ "id": "image-alt", "impact": "critical", "help": "Images need alt text", "nodes": [{}, {}] }),
                json!({ "id": "list", "impact": "serious", "help": "Lists must be lists", "nodes": [{}] }),
            ],
            Some("after login"),
        ));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "2 accessibility violations detected in home.yaml [after login]");
        assert_eq!(lines[1], "  - image-alt (critical): Images need alt text [2 nodes]");
        assert_eq!(lines[2], "  - list (serious): Lists must be lists [1 node]");
    }

    #[test]
    fn test_render_malformed_as_empty() {
        let text = ConsoleReporter::render(&results(vec![json!(null), json!({ "id": [1] })], None));
        assert!(text.contains("  -  ():  [0 nodes]"));
    }

    #[test]
    fn test_console_writes_nothing_for_empty() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone());
        reporter.report(&results(vec![], None)).unwrap();
        assert!(buf.0.lock().is_empty());
    }

    #[test]
    fn test_console_writes_to_writer() {
        let buf = SharedBuf::default();
        let reporter = ConsoleReporter::with_writer(buf.clone());
        reporter
            .report(&results(vec![json!({ "id": "region" })], None))
            .unwrap();
        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert!(written.starts_with("1 accessibility violation detected in home.yaml\n"));
    }

    #[test]
    fn test_console_write_failure_is_logged_not_returned() {
        let reporter = ConsoleReporter::with_writer(ClosedPipe);
        let logs = capture_logs(|| {
            assert!(reporter
                .report(&results(vec![json!({ "id": "region" })], None))
                .is_ok());
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Failed to write accessibility report"));
    }

    #[test_case(Level::ERROR, "ERROR")]
    #[test_case(Level::WARN, "WARN")]
    #[test_case(Level::INFO, "INFO")]
    #[test_case(Level::DEBUG, "DEBUG")]
    #[test_case(Level::TRACE, "DEBUG" ; "trace falls back to debug")]
    fn test_tracing_reporter_level(level: Level, expected: &str) {
        let reporter = TracingReporter::new(level);
        let logs = capture_logs(|| {
            let report = results(
                vec![
                    json!({ "id": "image-alt", "impact": "critical", "help": "Images need alt text", "nodes": [{}] }),
                    json!(null),
                ],
                Some("checkout"),
            );
            assert!(reporter.report(&report).is_ok());
        });

        let lines: Vec<_> = logs.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.contains(expected)));
        assert!(lines[0].contains("Images need alt text"));
        assert!(lines[0].contains("image-alt"));
        assert!(lines[0].contains("spec=home.yaml"));
    }

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::new();
        reporter.report(&results(vec![json!({ "id": "a" })], Some("x"))).unwrap();
        assert_eq!(reporter.len(), 1);
        assert_eq!(reporter.reports()[0].label.as_deref(), Some("x"));
        reporter.clear();
        assert!(reporter.is_empty());
    }
}
