use std::sync::Arc;

use portal_core::model::{Course, CourseId, Lesson};
use storage::repository::CourseRepository;

use crate::error::CatalogError;

/// Dashboard filter state: category buttons, language selector, search box.
///
/// Filtering happens after the fetch, the way the dashboard applied it to the
/// already-loaded course list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    /// Exact category match; `None` is the "all" button.
    pub category: Option<String>,
    /// Case-insensitive language match; `None` is "all languages".
    pub language: Option<String>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

impl CourseFilter {
    fn matches(&self, course: &Course) -> bool {
        if let Some(category) = &self.category {
            if course.category() != category {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if !course.language().eq_ignore_ascii_case(language) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !course.title().to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// A course together with its ordered lessons, as the course page needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseView {
    pub course: Course,
    pub lessons: Vec<Lesson>,
}

/// Read-side catalog queries for the dashboard and course pages.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// Courses matching the dashboard filters.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the fetch fails.
    pub async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, CatalogError> {
        let all = self.courses.list_courses().await?;
        Ok(all.into_iter().filter(|c| filter.matches(c)).collect())
    }

    /// Total course count for the hero stats.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the fetch fails.
    pub async fn course_count(&self) -> Result<usize, CatalogError> {
        Ok(self.courses.list_courses().await?.len())
    }

    /// A course and its lessons in playback order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CourseNotFound` for an unknown id.
    pub async fn get_course(&self, id: CourseId) -> Result<CourseView, CatalogError> {
        let Some(course) = self.courses.get_course(id).await? else {
            return Err(CatalogError::CourseNotFound);
        };
        let lessons = self.courses.lessons_for_course(id).await?;
        Ok(CourseView { course, lessons })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
