#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod catalog_service;
pub mod certificate_service;
pub mod error;
pub mod learning_service;
pub mod progress_tracker;
pub mod support_service;
pub mod upload_service;

pub use portal_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, PhoneCheck, Session, SignupForm};
pub use catalog_service::{CatalogService, CourseFilter, CourseView};
pub use certificate_service::CertificateService;
pub use error::{
    AppServicesError, AuthError, CatalogError, CertificateServiceError, LearningError,
    ProgressError, SupportError, UploadError,
};
pub use learning_service::{CourseProgress, LearningOverview, LearningService};
pub use progress_tracker::{CourseTracker, ProgressService, SaveOutcome};
pub use support_service::{MissingTableMode, NewTicket, SupportService, TicketReceipt};
pub use upload_service::{UploadPreview, UploadService};
