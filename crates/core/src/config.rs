//! Layered check configuration
//!
//! A [`ConfigStore`] holds the long-lived configuration. Each check merges
//! the stored record with per-call [`ConfigOverrides`]; the merge is shallow,
//! so a present field replaces the stored one wholesale.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::filter::{FailAll, ViolationFilter};
use crate::reporter::{ConsoleReporter, ViolationReporter};

/// Fully resolved configuration for a check
#[derive(Clone)]
pub struct AuditConfiguration {
    /// Forwarded verbatim to the engine's run call
    pub audit_options: Value,

    /// Picks the fail-worthy violations
    pub should_fail: Arc<dyn ViolationFilter>,

    /// Receives fail-worthy violations when there are any
    pub violations_cb: Arc<dyn ViolationReporter>,

    /// Report violations but never fail the check
    pub skip_failures: bool,
}

impl Default for AuditConfiguration {
    fn default() -> Self {
        Self {
            audit_options: Value::Object(Default::default()),
            should_fail: Arc::new(FailAll),
            violations_cb: Arc::new(ConsoleReporter::new()),
            skip_failures: false,
        }
    }
}

impl fmt::Debug for AuditConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfiguration")
            .field("audit_options", &self.audit_options)
            .field("skip_failures", &self.skip_failures)
            .finish_non_exhaustive()
    }
}

impl AuditConfiguration {
    /// Shallow merge: every field present in `overrides` wins.
    pub fn merged(&self, overrides: &ConfigOverrides) -> Self {
        let mut merged = self.clone();
        merged.apply(overrides.clone());
        merged
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(options) = overrides.audit_options {
            self.audit_options = options;
        }
        if let Some(filter) = overrides.should_fail {
            self.should_fail = filter;
        }
        if let Some(reporter) = overrides.violations_cb {
            self.violations_cb = reporter;
        }
        if let Some(skip) = overrides.skip_failures {
            self.skip_failures = skip;
        }
    }
}

/// A partial configuration. Absent fields leave the base untouched.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub audit_options: Option<Value>,
    pub should_fail: Option<Arc<dyn ViolationFilter>>,
    pub violations_cb: Option<Arc<dyn ViolationReporter>>,
    pub skip_failures: Option<bool>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audit_options(mut self, options: Value) -> Self {
        self.audit_options = Some(options);
        self
    }

    pub fn should_fail(mut self, filter: impl ViolationFilter + 'static) -> Self {
        self.should_fail = Some(Arc::new(filter));
        self
    }

    pub fn violations_cb(mut self, reporter: impl ViolationReporter + 'static) -> Self {
        self.violations_cb = Some(Arc::new(reporter));
        self
    }

    /// Share a reporter the caller keeps a handle to
    pub fn shared_reporter(mut self, reporter: Arc<dyn ViolationReporter>) -> Self {
        self.violations_cb = Some(reporter);
        self
    }

    pub fn skip_failures(mut self, skip: bool) -> Self {
        self.skip_failures = Some(skip);
        self
    }

    /// Combine two partials, `later` winning wherever it has a value.
    pub fn merge(self, later: ConfigOverrides) -> Self {
        Self {
            audit_options: later.audit_options.or(self.audit_options),
            should_fail: later.should_fail.or(self.should_fail),
            violations_cb: later.violations_cb.or(self.violations_cb),
            skip_failures: later.skip_failures.or(self.skip_failures),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.audit_options.is_none()
            && self.should_fail.is_none()
            && self.violations_cb.is_none()
            && self.skip_failures.is_none()
    }
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("audit_options", &self.audit_options)
            .field("should_fail", &self.should_fail.as_ref().map(|_| ".."))
            .field("violations_cb", &self.violations_cb.as_ref().map(|_| ".."))
            .field("skip_failures", &self.skip_failures)
            .finish()
    }
}

static SHARED: Lazy<ConfigStore> = Lazy::new(ConfigStore::new);

/// Long-lived configuration, last write wins.
///
/// Clones share the same record. Pass a store explicitly to the orchestrator;
/// [`ConfigStore::shared`] exists for setups that want one per process.
#[derive(Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<AuditConfiguration>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AuditConfiguration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// The process-wide instance
    pub fn shared() -> &'static ConfigStore {
        &SHARED
    }

    /// Merge a partial into the stored record. No validation happens here.
    pub fn configure(&self, partial: ConfigOverrides) {
        tracing::debug!(?partial, "Updating stored audit configuration");
        self.inner.write().apply(partial);
    }

    pub fn snapshot(&self) -> AuditConfiguration {
        self.inner.read().clone()
    }

    pub fn reset(&self) {
        *self.inner.write() = AuditConfiguration::default();
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigStore").field(&*self.inner.read()).finish()
    }
}
