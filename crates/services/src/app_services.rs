use std::sync::Arc;

use storage::repository::{ActivityRepository, Storage};

use crate::Clock;
use crate::completion::{CompletionService, CompletionSink};
use crate::error::AppServicesError;
use crate::recorder::AttemptService;
use crate::resume::ResumeService;

/// Assembles the progress-tracking services over a storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    attempts: Arc<AttemptService>,
    resume: Arc<ResumeService>,
    completion: Arc<CompletionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        sink: Arc<dyn CompletionSink>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, sink))
    }

    /// Build services over in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock, sink: Arc<dyn CompletionSink>) -> Self {
        Self::from_storage(Storage::in_memory(), clock, sink)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, sink: Arc<dyn CompletionSink>) -> Self {
        let completion = Arc::new(CompletionService::new(
            Arc::clone(&storage.attempts),
            sink,
        ));
        let attempts = Arc::new(AttemptService::new(
            clock,
            Arc::clone(&storage.activities),
            Arc::clone(&storage.attempts),
            Arc::clone(&completion),
        ));
        let resume = Arc::new(ResumeService::new(Arc::clone(&storage.attempts)));

        Self {
            storage,
            attempts,
            resume,
            completion,
        }
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }

    #[must_use]
    pub fn resume(&self) -> Arc<ResumeService> {
        Arc::clone(&self.resume)
    }

    #[must_use]
    pub fn completion(&self) -> Arc<CompletionService> {
        Arc::clone(&self.completion)
    }

    #[must_use]
    pub fn activities(&self) -> Arc<dyn ActivityRepository> {
        Arc::clone(&self.storage.activities)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}
