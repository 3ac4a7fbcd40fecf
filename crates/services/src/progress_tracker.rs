use std::sync::Arc;

use portal_core::model::{
    COMPLETE_PERCENTAGE, Course, CourseId, Lesson, LessonId, LessonState, PhoneNumber, Progress,
};
use storage::repository::{ProgressRecord, ProgressRepository};
use tracing::warn;

use crate::Clock;
use crate::auth_service::Session;
use crate::error::ProgressError;

/// Result of a completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The completed-set changed and the new state was persisted.
    Saved { revision: u64, percentage: u8 },
    /// The lesson was already in the requested state; nothing was written.
    Unchanged,
}

/// Loads stored progress and opens per-course tracking sessions.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    /// Fetch stored progress for a (user, course) pair.
    ///
    /// A missing record is normal (the pair has simply never completed a
    /// lesson) and yields empty progress. Any other failure is logged and
    /// surfaced so the caller can decide how to degrade.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` for failures other than absence.
    pub async fn load(
        &self,
        phone: &PhoneNumber,
        course_id: CourseId,
    ) -> Result<Progress, ProgressError> {
        match self.progress.get_progress(phone, course_id).await {
            Ok(Some(record)) => Ok(record.into_progress()),
            Ok(None) => Ok(Progress::new(phone.clone(), course_id, self.clock.now())),
            Err(e) => {
                warn!(course = %course_id, error = %e, "failed to load progress");
                Err(e.into())
            }
        }
    }

    /// Open a tracker for one course view.
    ///
    /// The tracker owns all mutable state for the view; opening a new one is
    /// the reset boundary between course pages.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if loading stored progress fails.
    pub async fn start(
        &self,
        session: &Session,
        course: Course,
        mut lessons: Vec<Lesson>,
    ) -> Result<CourseTracker, ProgressError> {
        let progress = self.load(session.phone(), course.id()).await?;
        portal_core::model::sort_by_order(&mut lessons);
        Ok(CourseTracker {
            clock: self.clock,
            repo: Arc::clone(&self.progress),
            session: session.clone(),
            course,
            lessons,
            progress,
            current: None,
        })
    }
}

/// Session-scoped state for one user watching one course.
///
/// Holds the ordered lesson list, the completed-set, and the current-lesson
/// pointer. Every successful toggle recomputes the percentage and persists;
/// on a failed write the in-memory set stays authoritative for this session
/// and the error is returned for the caller to act on.
pub struct CourseTracker {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    session: Session,
    course: Course,
    lessons: Vec<Lesson>,
    progress: Progress,
    current: Option<usize>,
}

impl CourseTracker {
    // ─── Read side ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Percentage complete against this course's lesson list.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.progress
            .percentage_for(self.lessons.iter().map(Lesson::id))
    }

    /// True once every lesson is complete; gates the certificate button.
    #[must_use]
    pub fn certificate_eligible(&self) -> bool {
        self.percentage() >= COMPLETE_PERCENTAGE
    }

    #[must_use]
    pub fn lesson_state(&self, lesson: LessonId) -> LessonState {
        self.progress.state(lesson)
    }

    // ─── Navigation ────────────────────────────────────────────────────────

    /// The lesson currently loaded in the player, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Lesson> {
        self.current.map(|i| &self.lessons[i])
    }

    /// Jump to the first lesson (the "start learning" action).
    ///
    /// Returns `None` for a course without lessons.
    pub fn start(&mut self) -> Option<&Lesson> {
        if self.lessons.is_empty() {
            return None;
        }
        self.current = Some(0);
        self.current()
    }

    /// Load a specific lesson. Returns `false` for an id outside this course.
    pub fn select(&mut self, lesson: LessonId) -> bool {
        match self.lessons.iter().position(|l| l.id() == lesson) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        matches!(self.current, Some(i) if i + 1 < self.lessons.len())
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        matches!(self.current, Some(i) if i > 0)
    }

    /// Advance to the next lesson; clamped at the end of the course.
    pub fn next(&mut self) -> Option<&Lesson> {
        if self.has_next() {
            self.current = self.current.map(|i| i + 1);
            self.current()
        } else {
            None
        }
    }

    /// Step back to the previous lesson; clamped at the start.
    pub fn prev(&mut self) -> Option<&Lesson> {
        if self.has_prev() {
            self.current = self.current.map(|i| i - 1);
            self.current()
        } else {
            None
        }
    }

    // ─── Mutations ─────────────────────────────────────────────────────────

    /// Mark a lesson complete, recompute, and persist.
    ///
    /// Idempotent: a lesson that is already complete is a no-op and causes no
    /// write.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` for an id outside this course,
    /// or `ProgressError::Storage` when the write fails (the in-memory state
    /// keeps the mutation either way).
    pub async fn mark_complete(&mut self, lesson: LessonId) -> Result<SaveOutcome, ProgressError> {
        self.ensure_known(lesson)?;
        let changed = self.progress.mark_complete(lesson, self.clock.now());
        if !changed {
            return Ok(SaveOutcome::Unchanged);
        }
        self.persist().await
    }

    /// Remove a lesson from the completed-set, recompute, and persist.
    ///
    /// Idempotent like [`mark_complete`](Self::mark_complete).
    ///
    /// # Errors
    ///
    /// Same contract as [`mark_complete`](Self::mark_complete).
    pub async fn mark_incomplete(
        &mut self,
        lesson: LessonId,
    ) -> Result<SaveOutcome, ProgressError> {
        self.ensure_known(lesson)?;
        let changed = self.progress.mark_incomplete(lesson, self.clock.now());
        if !changed {
            return Ok(SaveOutcome::Unchanged);
        }
        self.persist().await
    }

    fn ensure_known(&self, lesson: LessonId) -> Result<(), ProgressError> {
        if self.lessons.iter().any(|l| l.id() == lesson) {
            Ok(())
        } else {
            Err(ProgressError::UnknownLesson(lesson))
        }
    }

    async fn persist(&mut self) -> Result<SaveOutcome, ProgressError> {
        let percentage = self.percentage();
        let record = ProgressRecord {
            user_phone: self.session.phone().clone(),
            course_id: self.course.id(),
            course_title: self.course.title().to_owned(),
            user_first_name: Some(self.session.first_name().to_owned()),
            user_last_name: Some(self.session.last_name().to_owned()),
            percentage,
            completed_lesson_ids: self.progress.completed().clone(),
            revision: self.progress.revision(),
            updated_at: self.progress.updated_at(),
        };

        match self.repo.upsert_progress(&record).await {
            Ok(revision) => {
                self.progress.set_revision(revision);
                Ok(SaveOutcome::Saved {
                    revision,
                    percentage,
                })
            }
            Err(e) => {
                warn!(
                    course = %self.course.id(),
                    error = %e,
                    "failed to persist progress; keeping in-memory state"
                );
                Err(e.into())
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_service::{AuthService, SignupForm};
    use portal_core::model::{NewLesson, VideoId};
    use portal_core::time::fixed_now;
    use storage::repository::{CourseRepository as _, InMemoryRepository, StorageError};

    async fn session(repo: &InMemoryRepository) -> Session {
        let auth = AuthService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
        auth.sign_up(SignupForm {
            phone: "+14155552671".to_owned(),
            first_name: "Asha".to_owned(),
            last_name: "Nair".to_owned(),
            email: "asha@example.com".to_owned(),
            pin: "1234".to_owned(),
            confirm_pin: "1234".to_owned(),
        })
        .await
        .unwrap()
    }

    async fn seeded_course(repo: &InMemoryRepository, lesson_count: u32) -> (Course, Vec<Lesson>) {
        let course = Course::new(
            CourseId::new_random(),
            "Tracked Course",
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
        let new_lessons: Vec<NewLesson> = (1..=lesson_count)
            .map(|i| {
                NewLesson::new(
                    format!("Lesson {i}"),
                    "desc",
                    VideoId::new(format!("vid{i:03}")).unwrap(),
                    i,
                    5,
                )
                .unwrap()
            })
            .collect();
        repo.insert_course(&course, &new_lessons).await.unwrap();
        let lessons = repo.lessons_for_course(course.id()).await.unwrap();
        (course, lessons)
    }

    async fn tracker(lesson_count: u32) -> (CourseTracker, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let session = session(&repo).await;
        let (course, lessons) = seeded_course(&repo, lesson_count).await;
        let service = ProgressService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));
        let tracker = service.start(&session, course, lessons).await.unwrap();
        (tracker, repo)
    }

    #[tokio::test]
    async fn fresh_pair_loads_empty_progress() {
        let (tracker, _) = tracker(4).await;
        assert_eq!(tracker.percentage(), 0);
        assert!(tracker.progress().completed().is_empty());
        assert!(!tracker.certificate_eligible());
    }

    #[tokio::test]
    async fn two_of_four_lessons_is_half_done() {
        let (mut tracker, _) = tracker(4).await;
        let ids: Vec<LessonId> = tracker.lessons().iter().map(Lesson::id).collect();

        tracker.mark_complete(ids[0]).await.unwrap();
        let outcome = tracker.mark_complete(ids[1]).await.unwrap();

        assert_eq!(tracker.percentage(), 50);
        assert!(matches!(
            outcome,
            SaveOutcome::Saved {
                percentage: 50,
                revision: 2
            }
        ));
    }

    #[tokio::test]
    async fn completing_everything_unlocks_the_certificate() {
        let (mut tracker, _) = tracker(3).await;
        let ids: Vec<LessonId> = tracker.lessons().iter().map(Lesson::id).collect();

        for id in &ids {
            tracker.mark_complete(*id).await.unwrap();
        }
        assert_eq!(tracker.percentage(), 100);
        assert!(tracker.certificate_eligible());

        tracker.mark_incomplete(ids[0]).await.unwrap();
        assert_eq!(tracker.percentage(), 66);
        assert!(!tracker.certificate_eligible());
    }

    #[tokio::test]
    async fn empty_course_never_completes() {
        let (tracker, _) = tracker(0).await;
        assert_eq!(tracker.percentage(), 0);
        assert!(!tracker.certificate_eligible());
    }

    #[tokio::test]
    async fn toggles_are_idempotent_and_skip_writes() {
        let (mut tracker, _) = tracker(2).await;
        let id = tracker.lessons()[0].id();

        assert!(matches!(
            tracker.mark_complete(id).await.unwrap(),
            SaveOutcome::Saved { revision: 1, .. }
        ));
        assert_eq!(
            tracker.mark_complete(id).await.unwrap(),
            SaveOutcome::Unchanged
        );
        // revision untouched by the no-op
        assert_eq!(tracker.progress().revision(), 1);

        assert!(matches!(
            tracker.mark_incomplete(id).await.unwrap(),
            SaveOutcome::Saved { revision: 2, .. }
        ));
        assert_eq!(
            tracker.mark_incomplete(id).await.unwrap(),
            SaveOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn foreign_lesson_id_is_rejected() {
        let (mut tracker, _) = tracker(2).await;
        let err = tracker.mark_complete(LessonId::new(9999)).await.unwrap_err();
        assert!(matches!(err, ProgressError::UnknownLesson(_)));
    }

    #[tokio::test]
    async fn progress_survives_reload() {
        let repo = InMemoryRepository::new();
        let session = session(&repo).await;
        let (course, lessons) = seeded_course(&repo, 4).await;
        let service = ProgressService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));

        let mut tracker = service
            .start(&session, course.clone(), lessons.clone())
            .await
            .unwrap();
        let ids: Vec<LessonId> = tracker.lessons().iter().map(Lesson::id).collect();
        tracker.mark_complete(ids[0]).await.unwrap();
        tracker.mark_complete(ids[2]).await.unwrap();

        // a new course view picks the stored set back up
        let reloaded = service.start(&session, course, lessons).await.unwrap();
        assert_eq!(reloaded.percentage(), 50);
        assert_eq!(
            reloaded.lesson_state(ids[0]),
            portal_core::model::LessonState::Completed
        );
        assert_eq!(
            reloaded.lesson_state(ids[1]),
            portal_core::model::LessonState::NotStarted
        );
        assert_eq!(reloaded.progress().revision(), 2);
    }

    #[tokio::test]
    async fn stale_tracker_surfaces_the_conflict() {
        let repo = InMemoryRepository::new();
        let session = session(&repo).await;
        let (course, lessons) = seeded_course(&repo, 2).await;
        let service = ProgressService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()));

        let mut first = service
            .start(&session, course.clone(), lessons.clone())
            .await
            .unwrap();
        let mut second = service.start(&session, course, lessons).await.unwrap();
        let id = first.lessons()[0].id();

        first.mark_complete(id).await.unwrap();

        // the second view still holds revision 0 and must not clobber
        let err = second
            .mark_complete(second.lessons()[1].id())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Storage(StorageError::StaleWrite)
        ));
        // its in-memory set keeps the mutation for this session
        assert_eq!(second.percentage(), 50);
    }

    #[tokio::test]
    async fn navigation_walks_the_ordered_lessons() {
        let (mut tracker, _) = tracker(3).await;

        assert!(tracker.current().is_none());
        assert!(tracker.next().is_none());

        let first = tracker.start().unwrap().id();
        assert!(!tracker.has_prev());
        assert!(tracker.has_next());

        let second = tracker.next().unwrap().id();
        assert_ne!(first, second);
        let third = tracker.next().unwrap().id();
        assert!(tracker.next().is_none());
        assert_eq!(tracker.current().unwrap().id(), third);

        assert_eq!(tracker.prev().unwrap().id(), second);
        assert!(tracker.select(first));
        assert!(!tracker.has_prev());
        assert!(!tracker.select(LessonId::new(9999)));
    }

    #[tokio::test]
    async fn start_returns_none_for_empty_course() {
        let (mut tracker, _) = tracker(0).await;
        assert!(tracker.start().is_none());
    }
}
