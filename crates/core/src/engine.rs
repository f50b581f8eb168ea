//! Boundary to the audit engine
//!
//! Implementations own no decision logic: they load the engine into the page,
//! pass options through, and return the engine's full violation list.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;
use crate::scope::Scope;
use crate::types::Violation;

#[async_trait]
pub trait AuditEngine: Send + Sync {
    /// Load the engine into the page. Safe to call more than once.
    async fn inject(&self) -> Result<()>;

    /// Engine-wide configuration, passed through verbatim.
    async fn configure(&self, options: &Value) -> Result<()>;

    /// Audit `scope` and return every violation found.
    ///
    /// Returns [`crate::Error::EngineNotInjected`] if [`AuditEngine::inject`]
    /// has not succeeded yet.
    async fn run(&self, scope: &Scope, options: &Value) -> Result<Vec<Violation>>;
}

#[async_trait]
impl<E: AuditEngine + ?Sized> AuditEngine for Arc<E> {
    async fn inject(&self) -> Result<()> {
        (**self).inject().await
    }

    async fn configure(&self, options: &Value) -> Result<()> {
        (**self).configure(options).await
    }

    async fn run(&self, scope: &Scope, options: &Value) -> Result<Vec<Violation>> {
        (**self).run(scope, options).await
    }
}
