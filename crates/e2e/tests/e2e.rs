//! E2E accessibility harness entry point
//!
//! This file is the test binary that runs accessibility checks from YAML specs.
//! Run with: cargo test --package axecheck-e2e --test e2e

use std::path::PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use axecheck_core::HarnessSettings;
use axecheck_e2e::playwright::{Browser, PlaywrightConfig};
use axecheck_e2e::runner::{RunnerConfig, TestSuiteResult};
use axecheck_e2e::{E2eResult, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "axecheck-e2e")]
#[command(about = "Accessibility checks for end-to-end specs")]
struct Args {
    /// Path to test specs directory
    #[arg(short, long, default_value = "tests/a11y/specs")]
    specs: PathBuf,

    /// Run only tests matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    name: Option<String>,

    /// Base URL of the application under test
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: Browser,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Path to the axe-core build
    #[arg(long, default_value = "node_modules/axe-core/axe.min.js")]
    axe_source: PathBuf,

    /// Harness settings file
    #[arg(short, long, default_value = "axecheck.toml")]
    config: PathBuf,

    /// Report violations without failing (overrides the settings file
    /// and AXECHECK_SKIP_FAILURES)
    #[arg(long)]
    skip_failures: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    // libtest flags passed through by `cargo test`
    #[allow(dead_code)]
    #[arg(long, hide = true)]
    nocapture: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Run async main
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };
    let result = rt.block_on(async_main(args));

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let mut settings = HarnessSettings::load(&args.config)?.with_env()?;
    if args.skip_failures {
        settings.skip_failures = Some(true);
    }

    let config = RunnerConfig {
        playwright: PlaywrightConfig {
            base_url: args.base_url,
            browser: args.browser,
            headless: !args.headed,
            axe_source: args.axe_source,
            ..Default::default()
        },
        settings,
        specs_dir: args.specs,
        output_dir: args.output,
    };

    let runner = TestRunner::with_config(config);

    let results = if let Some(name) = args.name {
        TestSuiteResult::single(runner.run_test(&name).await?)
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;

    Ok(results.failed == 0)
}
