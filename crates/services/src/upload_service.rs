use std::sync::Arc;

use portal_core::model::{CourseDraft, CourseId};
use storage::repository::CourseRepository;
use tracing::debug;

use crate::Clock;
use crate::error::UploadError;

/// Summary shown in the confirmation modal before publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPreview {
    pub title: String,
    pub owner: String,
    pub category: String,
    pub language: String,
    pub lesson_count: usize,
    pub total_duration_mins: u32,
    pub learning_points: Vec<String>,
}

/// Publishes new courses from the upload form.
#[derive(Clone)]
pub struct UploadService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
}

impl UploadService {
    #[must_use]
    pub fn new(clock: Clock, courses: Arc<dyn CourseRepository>) -> Self {
        Self { clock, courses }
    }

    /// Validate the draft and summarize it without persisting anything.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Draft` with the offending field or lesson index.
    pub fn preview(&self, draft: &CourseDraft) -> Result<UploadPreview, UploadError> {
        // validated against a throwaway id; nothing is stored
        let (course, lessons) = draft.validate(CourseId::new_random(), self.clock.now())?;
        Ok(UploadPreview {
            title: course.title().to_owned(),
            owner: course.owner().to_owned(),
            category: course.category().to_owned(),
            language: course.language().to_owned(),
            lesson_count: lessons.len(),
            total_duration_mins: draft.total_duration_mins(),
            learning_points: course.learning_points().to_vec(),
        })
    }

    /// Validate and publish a course; returns the minted course id.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Draft` for validation failures and
    /// `UploadError::Storage` if persistence fails.
    pub async fn upload(&self, draft: &CourseDraft) -> Result<CourseId, UploadError> {
        let id = CourseId::new_random();
        let (course, lessons) = draft.validate(id, self.clock.now())?;
        let lesson_ids = self.courses.insert_course(&course, &lessons).await?;
        debug!(course = %id, lessons = lesson_ids.len(), "published course");
        Ok(id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
