use std::sync::Arc;

use storage::repository::{Storage, StorageError};
use storage::snapshot::{AssessmentSnapshot, StorySnapshot};
use tracing::info;

use crate::api::{HttpStudyApi, StudyApi};
use crate::config::ApiConfig;
use crate::error::AppServicesError;
use crate::notify::Notifier;
use crate::sessions::{AssessmentSession, HydrateOutcome, SnapshotSlot, StorySession};

/// The single set of session managers for one running client.
///
/// Built once at startup and handed to consumers explicitly.
pub struct AppServices {
    assessment: AssessmentSession,
    story: StorySession,
}

/// Result of hydrating both sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrateReport {
    pub assessment: HydrateOutcome,
    pub story: HydrateOutcome,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, api: Arc<dyn StudyApi>, notifier: Arc<dyn Notifier>) -> Self {
        let assessment = AssessmentSession::new(
            Arc::clone(&api),
            Arc::clone(&storage.snapshots),
            Arc::clone(&notifier),
        );
        let story = StorySession::new(api, Arc::clone(&storage.snapshots), notifier);
        Self { assessment, story }
    }

    /// Build services backed by `SQLite` storage and the HTTP backend, then
    /// hydrate both sessions.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or hydration
    /// fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: ApiConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        info!(db_url, api = config.base_url(), "opening study sessions");
        let api: Arc<dyn StudyApi> = Arc::new(HttpStudyApi::new(config));

        let mut services = Self::new(&storage, api, notifier);
        services.hydrate().await?;
        Ok(services)
    }

    /// Delete both session snapshots from a `SQLite` store without building
    /// an API client.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage cannot be opened or a snapshot
    /// cannot be removed.
    pub async fn clear_sqlite(db_url: &str) -> Result<(), AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::clear_storage(&storage).await?;
        info!(db_url, "stored sessions cleared");
        Ok(())
    }

    /// Delete both session snapshots from `storage`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a snapshot cannot be removed.
    pub async fn clear_storage(storage: &Storage) -> Result<(), StorageError> {
        SnapshotSlot::<AssessmentSnapshot>::new(Arc::clone(&storage.snapshots))
            .clear()
            .await?;
        SnapshotSlot::<StorySnapshot>::new(Arc::clone(&storage.snapshots))
            .clear()
            .await
    }

    /// Restore both sessions from durable storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn hydrate(&mut self) -> Result<HydrateReport, StorageError> {
        let assessment = self.assessment.hydrate().await?;
        let story = self.story.hydrate().await?;
        info!(?assessment, ?story, "sessions hydrated");
        Ok(HydrateReport { assessment, story })
    }

    /// Reset both sessions and delete their snapshots.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a snapshot cannot be removed.
    pub async fn clear_all(&mut self) -> Result<(), StorageError> {
        self.assessment.reset().await?;
        self.story.clear().await
    }

    #[must_use]
    pub fn assessment(&self) -> &AssessmentSession {
        &self.assessment
    }

    pub fn assessment_mut(&mut self) -> &mut AssessmentSession {
        &mut self.assessment
    }

    #[must_use]
    pub fn story(&self) -> &StorySession {
        &self.story
    }

    pub fn story_mut(&mut self) -> &mut StorySession {
        &mut self.story
    }
}
