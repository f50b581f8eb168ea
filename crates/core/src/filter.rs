//! Selecting fail-worthy violations
//!
//! A filter is a pure function from the raw engine output to the violations
//! that should count against the test. Purity is a contract on the caller's
//! implementation; a filter that panics takes the check down with it.

use std::collections::HashSet;

use crate::types::{Impact, Violation};

pub trait ViolationFilter: Send + Sync {
    fn select(&self, violations: &[Violation]) -> Vec<Violation>;
}

impl<F> ViolationFilter for F
where
    F: Fn(&[Violation]) -> Vec<Violation> + Send + Sync,
{
    fn select(&self, violations: &[Violation]) -> Vec<Violation> {
        self(violations)
    }
}

/// Apply the configured filter, returning its output unchanged.
pub fn apply(filter: &dyn ViolationFilter, raw: &[Violation]) -> Vec<Violation> {
    filter.select(raw)
}

/// Every violation fails the check. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailAll;

impl ViolationFilter for FailAll {
    fn select(&self, violations: &[Violation]) -> Vec<Violation> {
        violations.to_vec()
    }
}

/// Nothing fails the check.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailNone;

impl ViolationFilter for FailNone {
    fn select(&self, _violations: &[Violation]) -> Vec<Violation> {
        Vec::new()
    }
}

/// Keep violations at or above an impact level.
///
/// Violations whose impact cannot be read are kept.
#[derive(Debug, Clone, Copy)]
pub struct MinImpact(pub Impact);

impl ViolationFilter for MinImpact {
    fn select(&self, violations: &[Violation]) -> Vec<Violation> {
        violations
            .iter()
            .filter(|v| v.impact().map_or(true, |impact| impact >= self.0))
            .cloned()
            .collect()
    }
}

/// Drop violations of the named rules.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules(HashSet<String>);

impl IgnoreRules {
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(rules.into_iter().map(Into::into).collect())
    }
}

impl ViolationFilter for IgnoreRules {
    fn select(&self, violations: &[Violation]) -> Vec<Violation> {
        violations
            .iter()
            .filter(|v| !self.0.contains(v.id()))
            .cloned()
            .collect()
    }
}

/// Runs two filters in sequence
pub struct Chain<A, B>(pub A, pub B);

impl<A: ViolationFilter, B: ViolationFilter> ViolationFilter for Chain<A, B> {
    fn select(&self, violations: &[Violation]) -> Vec<Violation> {
        let first = self.0.select(violations);
        self.1.select(&first)
    }
}
