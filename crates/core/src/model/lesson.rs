use thiserror::Error;

use crate::model::ids::{CourseId, LessonId};
use crate::model::video::VideoId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson description cannot be empty")]
    EmptyDescription,

    #[error("lesson duration must be > 0 minutes")]
    ZeroDuration,

    #[error("lesson order is 1-based and cannot be 0")]
    ZeroOrder,
}

//
// ─── NEW LESSON ────────────────────────────────────────────────────────────────
//

/// A validated lesson that has not been persisted yet.
///
/// Lesson ids are assigned by the backend at insert time, so uploads carry
/// `NewLesson` values and read paths carry `Lesson`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    title: String,
    description: String,
    video: VideoId,
    order: u32,
    duration_mins: u32,
}

impl NewLesson {
    /// Creates a validated, unkeyed lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title or description is empty after
    /// trimming, the duration is zero, or the order is zero.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        video: VideoId,
        order: u32,
        duration_mins: u32,
    ) -> Result<Self, LessonError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        let description = description.into().trim().to_owned();
        if description.is_empty() {
            return Err(LessonError::EmptyDescription);
        }
        if duration_mins == 0 {
            return Err(LessonError::ZeroDuration);
        }
        if order == 0 {
            return Err(LessonError::ZeroOrder);
        }

        Ok(Self {
            title,
            description,
            video,
            order,
            duration_mins,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn video(&self) -> &VideoId {
        &self.video
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn duration_mins(&self) -> u32 {
        self.duration_mins
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// One video unit within a course.
///
/// The `order` field is externally assigned and determines the playback
/// sequence; it is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    course_id: CourseId,
    title: String,
    description: String,
    video: VideoId,
    order: u32,
    duration_mins: u32,
}

impl Lesson {
    /// Creates a `Lesson`.
    ///
    /// # Errors
    ///
    /// Same validation as [`NewLesson::new`].
    pub fn new(
        id: LessonId,
        course_id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        video: VideoId,
        order: u32,
        duration_mins: u32,
    ) -> Result<Self, LessonError> {
        let new = NewLesson::new(title, description, video, order, duration_mins)?;
        Ok(Self::from_parts(id, course_id, new))
    }

    /// Attaches backend-assigned keys to a validated `NewLesson`.
    #[must_use]
    pub fn from_parts(id: LessonId, course_id: CourseId, new: NewLesson) -> Self {
        Self {
            id,
            course_id,
            title: new.title,
            description: new.description,
            video: new.video,
            order: new.order,
            duration_mins: new.duration_mins,
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn video(&self) -> &VideoId {
        &self.video
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn duration_mins(&self) -> u32 {
        self.duration_mins
    }
}

/// Sorts lessons into playback order.
pub fn sort_by_order(lessons: &mut [Lesson]) {
    lessons.sort_by_key(Lesson::order);
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
