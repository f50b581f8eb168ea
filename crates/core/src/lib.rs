//! axecheck core
//!
//! Decides what an accessibility audit means for a test. The audit engine
//! itself is a black box behind [`AuditEngine`]; this crate owns everything
//! between its raw violation list and the pass/fail of the calling test.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      AuditOrchestrator                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  check_a11y(context, overrides, label)                       │
//! │    ├── Scope::from(context)          -> Scope                │
//! │    ├── ConfigStore::snapshot() ⊕ overrides                   │
//! │    ├── AuditEngine::run(scope, audit_options) -> violations  │
//! │    ├── ViolationFilter::select(violations) -> fail-worthy    │
//! │    ├── ViolationReporter::report(RunResults)   (non-empty)   │
//! │    └── assert_violations(fail-worthy)  (unless skipping)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod reporter;
pub mod scope;
pub mod settings;
pub mod types;

pub use config::{AuditConfiguration, ConfigOverrides, ConfigStore};
pub use engine::AuditEngine;
pub use error::{Error, Result};
pub use filter::{Chain, FailAll, FailNone, IgnoreRules, MinImpact, ViolationFilter};
pub use orchestrator::{
    assert_violations, violation_message, AuditOrchestrator, CheckReport, CheckStage,
};
pub use reporter::{
    CollectingReporter, ConsoleReporter, SilentReporter, TracingReporter, ViolationReporter,
};
pub use scope::{ElementRef, Scope};
pub use settings::HarnessSettings;
pub use types::{Impact, RunResults, Violation};

/// axecheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
