//! axecheck E2E accessibility runner
//!
//! This crate drives accessibility checks from declarative YAML specs:
//! - Records page steps and replays them in a Playwright page
//! - Loads axe-core into the page and runs it over a chosen scope
//! - Hands the violations to the `axecheck-core` policy pipeline
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   E2E A11y Runner (Rust)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                  │
//! │    ├── ConfigStore (shared by every spec in the run)        │
//! │    ├── PlaywrightEngine: PageSession + AuditEngine          │
//! │    └── run_spec(spec) -> TestResult                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags                              │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate / click / fill / press / wait         │
//! │          ├── inject_axe                                     │
//! │          ├── configure_axe { options }                      │
//! │          ├── configure_harness { skip_failures, ... }       │
//! │          └── check_a11y { context?, options?, label? }      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod playwright;
pub mod runner;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use playwright::{PlaywrightConfig, PlaywrightEngine};
pub use runner::{PageSession, TestRunner};
pub use spec::{TestSpec, TestStep};
