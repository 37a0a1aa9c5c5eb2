//! Per-session view state: listing, selection, sort/filter settings and the pending notice.
//!
//! Lives only in process memory and is dropped on sign-out.

use serde::Serialize;

use crate::batch::{share_links, BatchAction, BatchCoordinator, BatchOutcome, Selection, Settled};
use crate::error::{DriveError, Result};
use crate::files::FileService;
use crate::lifecycle::TrashLifecycle;
use crate::storage::models::FileRecord;
use crate::view::ViewSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient message for the user, replaced by the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub selection: Selection,
    pub view: ViewSettings,
    /// Folder the listing was loaded for, `None` for everything
    pub folder_id: Option<String>,
    listing: Vec<FileRecord>,
    notice: Option<Notice>,
}

impl Workspace {
    pub fn info(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Reload the listing from the record store.
    pub async fn refresh(
        &mut self,
        files: &FileService,
        owner_email: &str,
        folder_id: Option<&str>,
    ) -> Result<()> {
        self.listing = files.list_active(owner_email, folder_id).await?;
        self.folder_id = folder_id.map(str::to_string);
        Ok(())
    }

    /// Listing after filter and sort.
    pub fn visible(&self) -> Vec<FileRecord> {
        self.view.apply(&self.listing)
    }

    /// Select-all/none over what is currently visible.
    pub fn toggle_select_all(&mut self) {
        let ids: Vec<String> = self.visible().into_iter().map(|f| f.id).collect();
        self.selection.select_all(ids);
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.listing
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| DriveError::file_not_found(id))
    }

    /// Flip the favorite flag locally, then confirm remotely; reverts on failure.
    pub async fn toggle_favorite(
        &mut self,
        lifecycle: &TrashLifecycle,
        id: &str,
    ) -> Result<FileRecord> {
        let index = self.position(id)?;
        let before = self.listing[index].clone();
        self.listing[index].is_favorite = !before.is_favorite;

        match lifecycle.toggle_favorite(&before).await {
            Ok(confirmed) => {
                self.listing[index] = confirmed.clone();
                self.info(if confirmed.is_favorite {
                    "Added to favorites"
                } else {
                    "Removed from favorites"
                });
                Ok(confirmed)
            }
            Err(e) => {
                tracing::warn!(file_id = %id, error = %e, "Favorite toggle failed, reverting");
                self.listing[index] = before;
                self.error("Error updating favorite status");
                Err(e)
            }
        }
    }

    /// Remove the file from the listing, then trash it remotely; reinserts on failure.
    pub async fn move_to_trash(
        &mut self,
        lifecycle: &TrashLifecycle,
        id: &str,
    ) -> Result<FileRecord> {
        let index = self.position(id)?;
        let before = self.listing.remove(index);
        let was_selected = self.selection.contains(id);
        self.selection.deselect(id);

        match lifecycle.move_to_trash(&before).await {
            Ok(trashed) => {
                self.info("File moved to trash");
                Ok(trashed)
            }
            Err(e) => {
                tracing::warn!(file_id = %id, error = %e, "Move to trash failed, reverting");
                self.listing.insert(index, before);
                if was_selected {
                    self.selection.select(id);
                }
                self.error("Error moving file to trash");
                Err(e)
            }
        }
    }

    /// Run a batch over the selection. The selection is cleared whatever the outcome,
    /// and one notice summarizes it.
    pub async fn run_batch(
        &mut self,
        coordinator: &BatchCoordinator,
        action: BatchAction,
    ) -> BatchOutcome {
        let ids: Vec<String> = self.selection.ids().map(str::to_string).collect();
        let (outcome, settled) = coordinator
            .run_settled(action, ids.iter().map(String::as_str))
            .await;
        self.selection.clear();
        self.reconcile(&settled);

        if outcome.all_succeeded() {
            let verb = match action {
                BatchAction::Trash => "moved to trash",
                BatchAction::Restore => "restored",
                BatchAction::Purge => "deleted permanently",
            };
            self.info(format!("{} files {verb}", outcome.succeeded));
        } else {
            let noun = match action {
                BatchAction::Trash => "deleting",
                BatchAction::Restore => "restoring",
                BatchAction::Purge => "permanently deleting",
            };
            self.error(format!("Error {noun} files"));
        }
        outcome
    }

    /// Bring the cached listing in line with what a batch did to each file.
    fn reconcile(&mut self, settled: &[Settled]) {
        for item in settled {
            let cached = self.listing.iter().position(|f| f.id == item.id());
            let listed = match item {
                Settled::Updated(file) if !file.is_in_trash && self.in_loaded_folder(file) => {
                    Some(file.clone())
                }
                _ => None,
            };
            match (cached, listed) {
                (Some(index), Some(file)) => self.listing[index] = file,
                (Some(index), None) => {
                    self.listing.remove(index);
                }
                (None, Some(file)) => self.listing.push(file),
                (None, None) => {}
            }
        }
    }

    fn in_loaded_folder(&self, file: &FileRecord) -> bool {
        self.folder_id
            .as_deref()
            .map_or(true, |folder| file.parent_folder_id.as_deref() == Some(folder))
    }

    /// Blob URLs of the selected files in display order.
    pub fn share(&self) -> String {
        let visible = self.visible();
        share_links(visible.iter().filter(|f| self.selection.contains(&f.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_file, test_services, OWNER};

    #[tokio::test]
    async fn favorite_toggle_reverts_when_remote_fails() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        services.seed_file(sample_file("f1", "a.txt")).await;

        let mut ws = Workspace::default();
        ws.refresh(&services.files, OWNER, None).await.unwrap();

        // The record disappears underneath the cached listing
        services.db.delete_file("f1").unwrap();

        assert!(ws.toggle_favorite(&services.lifecycle, "f1").await.is_err());
        assert!(!ws.visible()[0].is_favorite);
        assert_eq!(ws.take_notice().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn favorite_toggle_commits_confirmed_record() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        services.seed_file(sample_file("f1", "a.txt")).await;

        let mut ws = Workspace::default();
        ws.refresh(&services.files, OWNER, None).await.unwrap();
        let confirmed = ws.toggle_favorite(&services.lifecycle, "f1").await.unwrap();

        assert!(confirmed.is_favorite);
        assert!(ws.visible()[0].is_favorite);
        assert_eq!(
            ws.take_notice().unwrap().message,
            "Added to favorites".to_string()
        );
        assert!(ws.take_notice().is_none());
    }

    #[tokio::test]
    async fn trash_reinserts_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        services.seed_file(sample_file("f1", "a.txt")).await;
        services.seed_file(sample_file("f2", "b.txt")).await;

        let mut ws = Workspace::default();
        ws.refresh(&services.files, OWNER, None).await.unwrap();
        services.db.delete_file("f1").unwrap();

        ws.selection.select("f1");
        assert!(ws.move_to_trash(&services.lifecycle, "f1").await.is_err());
        let names: Vec<String> = ws.visible().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert!(ws.selection.contains("f1"));
    }

    #[tokio::test]
    async fn batch_trash_drops_files_from_listing() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        services.seed_file(sample_file("f1", "a.txt")).await;
        services.seed_file(sample_file("f2", "b.txt")).await;

        let mut ws = Workspace::default();
        ws.refresh(&services.files, OWNER, None).await.unwrap();
        ws.selection.select("f1");

        let outcome = ws.run_batch(&services.batch, BatchAction::Trash).await;
        assert_eq!(outcome, BatchOutcome { succeeded: 1, failed: 0 });

        let visible: Vec<String> = ws.visible().into_iter().map(|f| f.id).collect();
        assert_eq!(visible, vec!["f2"]);

        ws.toggle_select_all();
        let selected: Vec<&str> = ws.selection.ids().collect();
        assert_eq!(selected, vec!["f2"]);
        ws.selection.clear();

        // f1 is no longer in the listing, and the record stays untouched
        assert!(ws.toggle_favorite(&services.lifecycle, "f1").await.is_err());
        let stored = services.db.get_file("f1").unwrap().unwrap();
        assert!(stored.is_in_trash);
        assert!(!stored.is_favorite);
    }

    #[tokio::test]
    async fn batch_restore_returns_files_to_listing() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        let file = services.seed_file(sample_file("f1", "a.txt")).await;
        services.lifecycle.move_to_trash(&file).await.unwrap();

        let mut ws = Workspace::default();
        ws.refresh(&services.files, OWNER, None).await.unwrap();
        assert!(ws.visible().is_empty());

        ws.selection.select("f1");
        ws.run_batch(&services.batch, BatchAction::Restore).await;
        assert_eq!(ws.visible().len(), 1);
        assert!(!ws.visible()[0].is_in_trash);
    }

    #[tokio::test]
    async fn batch_clears_selection_even_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        services.seed_file(sample_file("f1", "a.txt")).await;
        services.seed_file(sample_file("f2", "b.txt")).await;

        let mut ws = Workspace::default();
        ws.refresh(&services.files, OWNER, None).await.unwrap();
        ws.toggle_select_all();
        services.db.delete_file("f2").unwrap();

        let outcome = ws.run_batch(&services.batch, BatchAction::Trash).await;
        assert_eq!(outcome, BatchOutcome { succeeded: 1, failed: 1 });
        assert!(ws.selection.is_empty());
        assert_eq!(ws.take_notice().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn share_lists_selected_blob_refs() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        let a = services.seed_file(sample_file("f1", "a.txt")).await;
        services.seed_file(sample_file("f2", "b.txt")).await;
        let c = services.seed_file(sample_file("f3", "c.txt")).await;

        let mut ws = Workspace::default();
        ws.refresh(&services.files, OWNER, None).await.unwrap();
        ws.selection.select("f3");
        ws.selection.select("f1");

        assert_eq!(ws.share(), format!("{}\n{}", a.blob_ref, c.blob_ref));
    }
}
