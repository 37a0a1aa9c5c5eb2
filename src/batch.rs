//! Multi-select state and fan-out of one action across the selected files.

use std::collections::BTreeSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::{DriveError, Result};
use crate::lifecycle::TrashLifecycle;
use crate::storage::models::FileRecord;

/// Set of selected file ids. Ordered so share lists and responses are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn select(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn deselect(&mut self, id: &str) {
        self.ids.remove(id);
    }

    /// Flip membership of a single id, as a row checkbox does.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Select every candidate, or clear if the selection already is exactly the candidates.
    pub fn select_all<I, S>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: BTreeSet<String> = candidates.into_iter().map(Into::into).collect();
        if self.ids == candidates {
            self.ids.clear();
        } else {
            self.ids = candidates;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Aggregate result of a fan-out. Individual failures are only logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    Trash,
    Restore,
    Purge,
}

impl BatchAction {
    fn verb(self) -> &'static str {
        match self {
            BatchAction::Trash => "trash",
            BatchAction::Restore => "restore",
            BatchAction::Purge => "purge",
        }
    }
}

/// State of one file after a successful batch step.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Updated(FileRecord),
    Purged(String),
}

impl Settled {
    pub fn id(&self) -> &str {
        match self {
            Settled::Updated(file) => &file.id,
            Settled::Purged(id) => id,
        }
    }
}

/// Runs one lifecycle transition across many files concurrently.
#[derive(Clone)]
pub struct BatchCoordinator {
    lifecycle: TrashLifecycle,
}

impl BatchCoordinator {
    pub fn new(lifecycle: TrashLifecycle) -> Self {
        Self { lifecycle }
    }

    pub async fn batch_trash<'a, I>(&self, ids: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.run(BatchAction::Trash, ids).await
    }

    pub async fn batch_restore<'a, I>(&self, ids: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.run(BatchAction::Restore, ids).await
    }

    pub async fn batch_purge<'a, I>(&self, ids: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.run(BatchAction::Purge, ids).await
    }

    pub async fn run<'a, I>(&self, action: BatchAction, ids: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.run_settled(action, ids).await.0
    }

    /// Issue every transition at once and wait for all of them to settle.
    /// Nothing that succeeded is rolled back when a sibling fails.
    ///
    /// Alongside the counts, returns what each successful item became.
    pub async fn run_settled<'a, I>(
        &self,
        action: BatchAction,
        ids: I,
    ) -> (BatchOutcome, Vec<Settled>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let results = join_all(ids.into_iter().map(|id| self.apply(action, id))).await;

        let mut outcome = BatchOutcome::default();
        let mut settled = Vec::new();
        for result in results {
            match result {
                Ok(item) => {
                    outcome.succeeded += 1;
                    settled.push(item);
                }
                Err((id, e)) => {
                    tracing::warn!(file_id = %id, action = action.verb(), error = %e, "Batch item failed");
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            action = action.verb(),
            total = outcome.total(),
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Batch finished"
        );
        (outcome, settled)
    }

    async fn apply(&self, action: BatchAction, id: &str) -> Result<Settled, (String, DriveError)> {
        let step = async {
            let file = self.lifecycle.load(id).await?;
            match action {
                BatchAction::Trash => self
                    .lifecycle
                    .move_to_trash(&file)
                    .await
                    .map(Settled::Updated),
                BatchAction::Restore => self.lifecycle.restore(&file).await.map(Settled::Updated),
                BatchAction::Purge => self
                    .lifecycle
                    .purge(&file)
                    .await
                    .map(|()| Settled::Purged(file.id.clone())),
            }
        };
        step.await.map_err(|e: DriveError| (id.to_string(), e))
    }
}

/// Newline-joined blob URLs of the given files, in the order given.
pub fn share_links<'a, I>(files: I) -> String
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    files
        .into_iter()
        .map(|f| f.blob_ref.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
