use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use portal_core::model::{COMPLETE_PERCENTAGE, Course, CourseId, PhoneNumber};
use storage::repository::{CourseRepository, ProgressRepository};
use tracing::debug;

use crate::error::LearningError;

/// One row on the my-learning page: a course joined with its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProgress {
    pub course: Course,
    pub percentage: u8,
    pub updated_at: DateTime<Utc>,
}

/// Everything the my-learning page shows for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningOverview {
    /// Number of courses with any progress record.
    pub enrolled: usize,
    /// Number of progress records at 100%.
    pub completed: usize,
    /// Courses strictly between 0 and 100 percent.
    pub in_progress: Vec<CourseProgress>,
    /// Courses at 100 percent.
    pub completed_courses: Vec<CourseProgress>,
}

/// Aggregates per-user progress for the my-learning page.
#[derive(Clone)]
pub struct LearningService {
    progress: Arc<dyn ProgressRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl LearningService {
    #[must_use]
    pub fn new(progress: Arc<dyn ProgressRepository>, courses: Arc<dyn CourseRepository>) -> Self {
        Self { progress, courses }
    }

    /// Build the my-learning overview for one user.
    ///
    /// Counters come from the progress rows alone; the course lists join
    /// against the catalog and skip rows whose course has since disappeared.
    ///
    /// # Errors
    ///
    /// Returns `LearningError::Storage` if either fetch fails.
    pub async fn overview(&self, phone: &PhoneNumber) -> Result<LearningOverview, LearningError> {
        let records = self.progress.list_progress_for_user(phone).await?;
        let courses = self.courses.list_courses().await?;
        let by_id: HashMap<CourseId, Course> =
            courses.into_iter().map(|c| (c.id(), c)).collect();

        let enrolled = records.len();
        let completed = records
            .iter()
            .filter(|r| r.percentage >= COMPLETE_PERCENTAGE)
            .count();

        let mut in_progress = Vec::new();
        let mut completed_courses = Vec::new();
        for record in records {
            let Some(course) = by_id.get(&record.course_id) else {
                debug!(course = %record.course_id, "progress row for a missing course; skipping");
                continue;
            };
            let row = CourseProgress {
                course: course.clone(),
                percentage: record.percentage,
                updated_at: record.updated_at,
            };
            if record.percentage >= COMPLETE_PERCENTAGE {
                completed_courses.push(row);
            } else if record.percentage > 0 {
                in_progress.push(row);
            }
        }

        Ok(LearningOverview {
            enrolled,
            completed,
            in_progress,
            completed_courses,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{LessonId, NewLesson, VideoId};
    use portal_core::time::fixed_now;
    use storage::repository::{
        CourseRepository as _, InMemoryRepository, ProgressRecord, ProgressRepository as _,
    };
    use std::collections::BTreeSet;

    fn phone() -> PhoneNumber {
        PhoneNumber::new("+14155552671").unwrap()
    }

    async fn seed_course(repo: &InMemoryRepository, title: &str) -> Course {
        let course = Course::new(
            CourseId::new_random(),
            title,
            "desc",
            "Programming",
            "English",
            "Owner",
            vec![],
            None,
            None,
            fixed_now(),
        )
        .unwrap();
        let lessons =
            vec![NewLesson::new("L1", "d", VideoId::new("v").unwrap(), 1, 5).unwrap()];
        repo.insert_course(&course, &lessons).await.unwrap();
        course
    }

    async fn seed_progress(repo: &InMemoryRepository, course_id: CourseId, percentage: u8) {
        repo.upsert_progress(&ProgressRecord {
            user_phone: phone(),
            course_id,
            course_title: "t".to_owned(),
            user_first_name: None,
            user_last_name: None,
            percentage,
            completed_lesson_ids: BTreeSet::from([LessonId::new(1)]),
            revision: 0,
            updated_at: fixed_now(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn overview_splits_in_progress_and_completed() {
        let repo = InMemoryRepository::new();
        let halfway = seed_course(&repo, "Halfway").await;
        let done = seed_course(&repo, "Done").await;
        seed_progress(&repo, halfway.id(), 50).await;
        seed_progress(&repo, done.id(), 100).await;

        let service = LearningService::new(Arc::new(repo.clone()), Arc::new(repo));
        let overview = service.overview(&phone()).await.unwrap();

        assert_eq!(overview.enrolled, 2);
        assert_eq!(overview.completed, 1);
        assert_eq!(overview.in_progress.len(), 1);
        assert_eq!(overview.in_progress[0].course.title(), "Halfway");
        assert_eq!(overview.completed_courses.len(), 1);
        assert_eq!(overview.completed_courses[0].course.title(), "Done");
    }

    #[tokio::test]
    async fn zero_percent_rows_count_as_enrolled_only() {
        let repo = InMemoryRepository::new();
        let course = seed_course(&repo, "Untouched").await;
        seed_progress(&repo, course.id(), 0).await;

        let service = LearningService::new(Arc::new(repo.clone()), Arc::new(repo));
        let overview = service.overview(&phone()).await.unwrap();

        assert_eq!(overview.enrolled, 1);
        assert!(overview.in_progress.is_empty());
        assert!(overview.completed_courses.is_empty());
    }

    #[tokio::test]
    async fn orphaned_progress_rows_are_skipped_in_lists() {
        let repo = InMemoryRepository::new();
        // progress without any matching course
        seed_progress(&repo, CourseId::new_random(), 60).await;

        let service = LearningService::new(Arc::new(repo.clone()), Arc::new(repo));
        let overview = service.overview(&phone()).await.unwrap();

        // counted as enrolled, but not renderable as a card
        assert_eq!(overview.enrolled, 1);
        assert!(overview.in_progress.is_empty());
    }

    #[tokio::test]
    async fn empty_user_has_an_empty_overview() {
        let repo = InMemoryRepository::new();
        let service = LearningService::new(Arc::new(repo.clone()), Arc::new(repo));
        let overview = service.overview(&phone()).await.unwrap();
        assert_eq!(overview.enrolled, 0);
        assert_eq!(overview.completed, 0);
    }
}
