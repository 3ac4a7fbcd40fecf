use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::CourseId;
use crate::model::lesson::{LessonError, NewLesson};
use crate::model::video::{VideoError, VideoId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course description cannot be empty")]
    EmptyDescription,

    #[error("course category cannot be empty")]
    EmptyCategory,

    #[error("course language cannot be empty")]
    EmptyLanguage,

    #[error("course owner cannot be empty")]
    EmptyOwner,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseDraftError {
    #[error(transparent)]
    Course(#[from] CourseError),

    #[error("a course needs at least one lesson")]
    NoLessons,

    #[error("lesson {index}: {source}")]
    InvalidLesson {
        index: usize,
        #[source]
        source: LessonError,
    },

    #[error("lesson {index}: {source}")]
    InvalidVideoUrl {
        index: usize,
        #[source]
        source: VideoError,
    },
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A published course: catalog metadata plus an ordered lesson sequence
/// stored separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    category: String,
    language: String,
    owner: String,
    learning_points: Vec<String>,
    thumbnail: Option<VideoId>,
    duration_text: Option<String>,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates a new `Course`.
    ///
    /// Text fields are trimmed; learning points are kept in order with blank
    /// entries dropped.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if title, description, category, language, or
    /// owner is empty after trimming.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        language: impl Into<String>,
        owner: impl Into<String>,
        learning_points: Vec<String>,
        thumbnail: Option<VideoId>,
        duration_text: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        let description = description.into().trim().to_owned();
        if description.is_empty() {
            return Err(CourseError::EmptyDescription);
        }
        let category = category.into().trim().to_owned();
        if category.is_empty() {
            return Err(CourseError::EmptyCategory);
        }
        let language = language.into().trim().to_owned();
        if language.is_empty() {
            return Err(CourseError::EmptyLanguage);
        }
        let owner = owner.into().trim().to_owned();
        if owner.is_empty() {
            return Err(CourseError::EmptyOwner);
        }

        let learning_points: Vec<String> = learning_points
            .into_iter()
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .collect();

        let duration_text = duration_text
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title,
            description,
            category,
            language,
            owner,
            learning_points,
            thumbnail,
            duration_text,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
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
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn learning_points(&self) -> &[String] {
        &self.learning_points
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<&VideoId> {
        self.thumbnail.as_ref()
    }

    #[must_use]
    pub fn duration_text(&self) -> Option<&str> {
        self.duration_text.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Raw lesson input from the upload form, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration_mins: u32,
}

/// Raw course input from the upload form.
///
/// `validate` turns the draft into a `Course` plus its lessons, assigning
/// 1-based order from input position and extracting video ids from raw URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub language: String,
    pub owner: String,
    /// One learning point per line; blank lines are dropped.
    pub learning_points: String,
    pub lessons: Vec<LessonDraft>,
}

impl CourseDraft {
    /// Validates the draft into a publishable course and its lessons.
    ///
    /// The course thumbnail defaults to the first lesson's video.
    ///
    /// # Errors
    ///
    /// Returns `CourseDraftError::NoLessons` for an empty lesson list,
    /// `InvalidLesson`/`InvalidVideoUrl` with the offending 0-based index,
    /// or a wrapped `CourseError` for course-level fields.
    pub fn validate(
        &self,
        id: CourseId,
        created_at: DateTime<Utc>,
    ) -> Result<(Course, Vec<NewLesson>), CourseDraftError> {
        if self.lessons.is_empty() {
            return Err(CourseDraftError::NoLessons);
        }

        let mut lessons = Vec::with_capacity(self.lessons.len());
        for (index, draft) in self.lessons.iter().enumerate() {
            let video = VideoId::from_watch_url(&draft.video_url)
                .map_err(|source| CourseDraftError::InvalidVideoUrl { index, source })?;
            let order = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let lesson = NewLesson::new(
                draft.title.clone(),
                draft.description.clone(),
                video,
                order,
                draft.duration_mins,
            )
            .map_err(|source| CourseDraftError::InvalidLesson { index, source })?;
            lessons.push(lesson);
        }

        let learning_points = self
            .learning_points
            .lines()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let thumbnail = Some(lessons[0].video().clone());

        let course = Course::new(
            id,
            self.title.clone(),
            self.description.clone(),
            self.category.clone(),
            self.language.clone(),
            self.owner.clone(),
            learning_points,
            thumbnail,
            Some(format!("{} min", self.total_duration_mins())),
            created_at,
        )?;

        Ok((course, lessons))
    }

    /// Total runtime across all lesson drafts, in minutes.
    #[must_use]
    pub fn total_duration_mins(&self) -> u32 {
        self.lessons
            .iter()
            .map(|l| l.duration_mins)
            .fold(0, u32::saturating_add)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
