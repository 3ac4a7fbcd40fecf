use std::sync::Arc;

use storage::repository::Storage;
use storage::rest::RestConfig;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::catalog_service::CatalogService;
use crate::certificate_service::CertificateService;
use crate::error::AppServicesError;
use crate::learning_service::LearningService;
use crate::progress_tracker::ProgressService;
use crate::support_service::{MissingTableMode, SupportService};
use crate::upload_service::UploadService;

/// Assembles the portal services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<AuthService>,
    catalog: Arc<CatalogService>,
    progress: Arc<ProgressService>,
    learning: Arc<LearningService>,
    certificates: Arc<CertificateService>,
    uploads: Arc<UploadService>,
    support: Arc<SupportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services backed by the hosted REST service.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be constructed.
    pub fn new_rest(config: &RestConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::rest(config)?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Wire services over an already-built storage aggregate.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let auth = Arc::new(AuthService::new(clock, Arc::clone(&storage.users)));
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.courses)));
        let progress = Arc::new(ProgressService::new(clock, Arc::clone(&storage.progress)));
        let learning = Arc::new(LearningService::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.courses),
        ));
        let certificates = Arc::new(CertificateService::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.courses),
        ));
        let uploads = Arc::new(UploadService::new(clock, Arc::clone(&storage.courses)));
        let support = Arc::new(SupportService::new(clock, Arc::clone(&storage.tickets)));

        Self {
            auth,
            catalog,
            progress,
            learning,
            certificates,
            uploads,
            support,
        }
    }

    /// Replace the support service's missing-table behavior.
    #[must_use]
    pub fn with_support_mode(mut self, mode: MissingTableMode) -> Self {
        let support = (*self.support).clone().with_missing_table_mode(mode);
        self.support = Arc::new(support);
        self
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn learning(&self) -> Arc<LearningService> {
        Arc::clone(&self.learning)
    }

    #[must_use]
    pub fn certificates(&self) -> Arc<CertificateService> {
        Arc::clone(&self.certificates)
    }

    #[must_use]
    pub fn uploads(&self) -> Arc<UploadService> {
        Arc::clone(&self.uploads)
    }

    #[must_use]
    pub fn support(&self) -> Arc<SupportService> {
        Arc::clone(&self.support)
    }
}
