use std::sync::Arc;

use portal_core::model::{COMPLETE_PERCENTAGE, Certificate, CertificateError, CourseId};
use storage::repository::{CourseRepository, ProgressRepository};
use tracing::debug;

use crate::auth_service::Session;
use crate::error::CertificateServiceError;

/// Issues certificates for completed courses.
#[derive(Clone)]
pub struct CertificateService {
    progress: Arc<dyn ProgressRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl CertificateService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>, courses: Arc<dyn CourseRepository>) -> Self {
        Self { progress, courses }
    }

    /// All certificates this user has earned, in completion order.
    ///
    /// Progress rows whose course has disappeared are skipped, same as on the
    /// my-learning page.
    ///
    /// # Errors
    ///
    /// Returns `CertificateServiceError::Storage` if a fetch fails.
    pub async fn earned(
        &self,
        session: &Session,
    ) -> Result<Vec<Certificate>, CertificateServiceError> {
        let records = self
            .progress
            .list_progress_for_user(session.phone())
            .await?;

        let mut certificates = Vec::new();
        for record in records {
            if record.percentage < COMPLETE_PERCENTAGE {
                continue;
            }
            let Some(course) = self.courses.get_course(record.course_id).await? else {
                debug!(course = %record.course_id, "completed course no longer exists; skipping");
                continue;
            };
            certificates.push(Certificate::new(
                session.display_name(),
                course.title(),
                course.category(),
                course.owner(),
                record.updated_at,
                course.duration_text().map(str::to_owned),
            )?);
        }
        Ok(certificates)
    }

    /// Issue the certificate for one course.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::NotEligible` (wrapped) below 100%,
    /// `CertificateServiceError::CourseNotFound` for an unknown course, or a
    /// wrapped storage error.
    pub async fn issue(
        &self,
        session: &Session,
        course_id: CourseId,
    ) -> Result<Certificate, CertificateServiceError> {
        let Some(record) = self.progress.get_progress(session.phone(), course_id).await? else {
            return Err(CertificateError::NotEligible { percentage: 0 }.into());
        };
        if record.percentage < COMPLETE_PERCENTAGE {
            return Err(CertificateError::NotEligible {
                percentage: record.percentage,
            }
            .into());
        }

        let Some(course) = self.courses.get_course(course_id).await? else {
            return Err(CertificateServiceError::CourseNotFound);
        };

        Ok(Certificate::new(
            session.display_name(),
            course.title(),
            course.category(),
            course.owner(),
            record.updated_at,
            course.duration_text().map(str::to_owned),
        )?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
