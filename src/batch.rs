//! Bounded-concurrency batch dispatch.
//!
//! Every identifier becomes one unit of work. At most `max_concurrent` units
//! are in flight at once and results come back in completion order. Each unit
//! runs on its own task, so a panic inside one resolution is caught at the
//! task boundary and reported as an error entry for that identifier.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::task::JoinError;

use crate::models::{BatchEntry, FetchOutcome};
use crate::resolver::Resolver;

/// Something that turns an identifier into an outcome
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, identifier: &str) -> FetchOutcome;
}

#[async_trait]
impl Resolve for Resolver {
    async fn resolve(&self, identifier: &str) -> FetchOutcome {
        self.fetch(identifier).await
    }
}

/// Runs many identifiers through a resolver with a concurrency cap
#[derive(Debug)]
pub struct BatchDispatcher<R: ?Sized> {
    resolver: Arc<R>,
    max_concurrent: usize,
}

impl<R: Resolve + ?Sized + 'static> BatchDispatcher<R> {
    /// A cap of zero is treated as one
    pub fn new(resolver: Arc<R>, max_concurrent: usize) -> Self {
        Self {
            resolver,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Resolve all identifiers, returning one entry per identifier
    pub async fn run(&self, identifiers: Vec<String>) -> Vec<BatchEntry> {
        self.run_with(identifiers, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_complete` as each entry finishes
    pub async fn run_with<F>(&self, identifiers: Vec<String>, mut on_complete: F) -> Vec<BatchEntry>
    where
        F: FnMut(&BatchEntry),
    {
        let total = identifiers.len();
        tracing::info!(total, max_concurrent = self.max_concurrent, "dispatching batch");

        let mut completions = stream::iter(identifiers.into_iter().map(|identifier| {
            let resolver = Arc::clone(&self.resolver);
            run_unit(resolver, identifier)
        }))
        .buffer_unordered(self.max_concurrent);

        let mut entries = Vec::with_capacity(total);
        while let Some(entry) = completions.next().await {
            tracing::debug!(
                identifier = %entry.identifier,
                status = %entry.outcome.status(),
                done = entries.len() + 1,
                total,
                "batch entry complete"
            );
            on_complete(&entry);
            entries.push(entry);
        }
        entries
    }
}

async fn run_unit<R: Resolve + ?Sized + 'static>(
    resolver: Arc<R>,
    identifier: String,
) -> BatchEntry {
    let task_identifier = identifier.clone();
    let handle = tokio::spawn(async move { resolver.resolve(&task_identifier).await });

    match handle.await {
        Ok(outcome) => BatchEntry::new(identifier, outcome),
        Err(e) => {
            let message = abort_message(e);
            tracing::error!(identifier = %identifier, error = %message, "resolution aborted");
            let outcome = FetchOutcome::error(message).with_identifier(identifier.clone());
            BatchEntry::new(identifier, outcome)
        }
    }
}

fn abort_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("Unexpected failure: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("Unexpected failure: {}", s)
    } else {
        "Unexpected failure while resolving".to_string()
    }
}
