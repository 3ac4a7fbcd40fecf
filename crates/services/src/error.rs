//! Shared error types for the services crate.

use thiserror::Error;

use portal_core::model::{CertificateError, CourseDraftError, LessonId, TicketError, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("phone number and PIN do not match")]
    InvalidCredentials,
    #[error("phone or email is already registered")]
    AlreadyRegistered,
    #[error("PIN entries do not match")]
    PinMismatch,
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("course not found")]
    CourseNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService` and `CourseTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("lesson {0} does not belong to this course")]
    UnknownLesson(LessonId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LearningService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LearningError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CertificateService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateServiceError {
    #[error("course not found")]
    CourseNotFound,
    #[error(transparent)]
    Certificate(#[from] CertificateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SupportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SupportError {
    #[error(transparent)]
    Ticket(#[from] TicketError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UploadService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UploadError {
    #[error(transparent)]
    Draft(#[from] CourseDraftError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
