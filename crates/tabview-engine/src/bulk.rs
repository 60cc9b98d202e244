//! Bulk actions over a selected id set
//!
//! A bulk action runs once per selected id. Each operation is spawned as its
//! own task and the dispatcher waits for all of them; one failure neither
//! cancels nor rolls back the others. Because operations are spawned,
//! dropping the future returned by [`BulkDispatcher::run`] does not abort
//! requests that were already sent.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tabview_core::{Result, RowId, TabviewError};

/// A side effect applied independently to each selected row
#[async_trait]
pub trait BulkAction: Send + Sync + 'static {
    /// Verb used in prompts, e.g. "archive"
    fn name(&self) -> &str;

    /// Verb used in summaries, e.g. "archived"
    fn past_tense(&self) -> &str;

    /// Destructive actions are only dispatched after confirmation
    fn is_destructive(&self) -> bool {
        false
    }

    fn confirmation_message(&self, count: usize) -> String {
        let noun = if count == 1 { "record" } else { "records" };
        format!("{} {} selected {}?", capitalize(self.name()), count, noun)
    }

    /// Apply the action to one row
    async fn execute(&self, id: &RowId) -> Result<()>;
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Asks the operator to confirm a destructive action
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Confirms every prompt, for non-interactive callers
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmationGate for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// One id whose operation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: RowId,
    pub error: String,
}

/// Aggregated result of a bulk action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub action: String,
    pub succeeded: Vec<RowId>,
    pub failed: Vec<RowId>,
    pub failures: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// e.g. "12 of 15 updated"
    pub fn summary(&self) -> String {
        format!("{} of {} {}", self.succeeded.len(), self.total(), self.action)
    }
}

/// Fans a bulk action out over selected ids
pub struct BulkDispatcher {
    gate: Arc<dyn ConfirmationGate>,
}

impl BulkDispatcher {
    pub fn new(gate: Arc<dyn ConfirmationGate>) -> Self {
        Self { gate }
    }

    /// A dispatcher that confirms every destructive action
    pub fn auto_confirm() -> Self {
        Self::new(Arc::new(AutoConfirm))
    }

    /// Run `action` once per id and wait for every operation.
    ///
    /// Fails with `EmptySelection` for an empty id list and with
    /// `ConfirmationDeclined` when a destructive action is not confirmed;
    /// in both cases nothing is dispatched.
    #[tracing::instrument(skip(self, action, ids), fields(action = %action.name(), count = ids.len()))]
    pub async fn run(&self, action: Arc<dyn BulkAction>, ids: Vec<RowId>) -> Result<BulkOutcome> {
        if ids.is_empty() {
            return Err(TabviewError::EmptySelection);
        }

        if action.is_destructive() {
            let message = action.confirmation_message(ids.len());
            if !self.gate.confirm(&message) {
                tracing::info!("Bulk action declined");
                return Err(TabviewError::ConfirmationDeclined(action.name().to_string()));
            }
        }

        let handles = ids.iter().cloned().map(|id| {
            let action = Arc::clone(&action);
            tokio::spawn(async move { action.execute(&id).await })
        });
        let results = join_all(handles).await;

        let mut outcome = BulkOutcome {
            action: action.past_tense().to_string(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            failures: Vec::new(),
        };
        for (id, result) in ids.into_iter().zip(results) {
            let error = match result {
                Ok(Ok(())) => {
                    outcome.succeeded.push(id);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(join_error) => format!("operation aborted: {}", join_error),
            };
            tracing::warn!(id = %id, error = %error, "Bulk operation failed");
            outcome.failed.push(id.clone());
            outcome.failures.push(BulkFailure { id, error });
        }

        tracing::info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "{}",
            outcome.summary()
        );
        Ok(outcome)
    }
}
