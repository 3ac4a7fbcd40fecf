//! Repository backend speaking PostgREST conventions to a hosted
//! database-as-a-service, the deployment target the portal pages originally
//! talked to directly.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::warn;

use crate::repository::{
    CourseRepository, ProgressRepository, Storage, StorageError, TicketRepository, UserRepository,
};

mod course_repo;
mod progress_repo;
mod records;
mod ticket_repo;
mod user_repo;

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://project.example.co`.
    pub base_url: String,
    /// Anonymous API key, sent both as `apikey` and bearer token.
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct RestRepository {
    client: reqwest::Client,
    base_url: String,
}

impl RestRepository {
    /// Builds a client with the service's auth headers preconfigured.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for a key that cannot form a
    /// header and `StorageError::Connection` if the client cannot be built.
    pub fn new(config: &RestConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }
}

pub(crate) fn http_err(e: reqwest::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Folds a non-success response into the storage error taxonomy.
///
/// 404 covers both missing rows and missing tables; callers that need the
/// distinction (the ticket path) handle `NotFound` themselves.
pub(crate) async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, StorageError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status {
        StatusCode::NOT_FOUND => Err(StorageError::NotFound),
        StatusCode::CONFLICT => Err(StorageError::Conflict),
        _ => {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "hosted backend rejected request");
            Err(StorageError::Connection(format!(
                "unexpected status {status}"
            )))
        }
    }
}

impl Storage {
    /// Build a `Storage` backed by the hosted REST service.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the HTTP client cannot be constructed.
    pub fn rest(config: &RestConfig) -> Result<Self, StorageError> {
        let repo = RestRepository::new(config)?;
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let tickets: Arc<dyn TicketRepository> = Arc::new(repo);
        Ok(Self {
            users,
            courses,
            progress,
            tickets,
        })
    }
}
