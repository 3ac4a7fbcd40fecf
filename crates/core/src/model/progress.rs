use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::model::ids::{CourseId, LessonId};
use crate::model::user::PhoneNumber;

/// Percentage at which a course counts as complete and a certificate can be
/// issued.
pub const COMPLETE_PERCENTAGE: u8 = 100;

/// Completion state of a single lesson for one (user, course) pair.
///
/// Transitions are reversible: `mark_complete` moves to `Completed`,
/// `mark_incomplete` moves back to `NotStarted`. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonState {
    NotStarted,
    Completed,
}

/// Completion percentage as the portal displays it: floor division,
/// 0 for a course with no lessons.
#[must_use]
pub fn completion_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = completed.min(total) * 100 / total;
    // completed is clamped to total above, so this cannot exceed 100
    u8::try_from(pct).unwrap_or(COMPLETE_PERCENTAGE)
}

/// Per-user, per-course record of completed lessons.
///
/// The completed-set is the source of truth; the percentage is always derived
/// against a course's current lesson list, counting only ids that still
/// belong to it. `revision` increments on every persisted write so storage
/// backends can reject stale writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    user_phone: PhoneNumber,
    course_id: CourseId,
    completed: BTreeSet<LessonId>,
    revision: u64,
    updated_at: DateTime<Utc>,
}

impl Progress {
    /// Creates empty progress for a (user, course) pair.
    #[must_use]
    pub fn new(user_phone: PhoneNumber, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            user_phone,
            course_id,
            completed: BTreeSet::new(),
            revision: 0,
            updated_at: now,
        }
    }

    /// Rebuilds progress from a persisted record.
    #[must_use]
    pub fn from_persisted(
        user_phone: PhoneNumber,
        course_id: CourseId,
        completed: BTreeSet<LessonId>,
        revision: u64,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_phone,
            course_id,
            completed,
            revision,
            updated_at,
        }
    }

    // Accessors
    #[must_use]
    pub fn user_phone(&self) -> &PhoneNumber {
        &self.user_phone
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn completed(&self) -> &BTreeSet<LessonId> {
        &self.completed
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Completion state of one lesson.
    #[must_use]
    pub fn state(&self, lesson: LessonId) -> LessonState {
        if self.completed.contains(&lesson) {
            LessonState::Completed
        } else {
            LessonState::NotStarted
        }
    }

    /// Marks a lesson complete. Returns `false` when it already was
    /// (idempotent no-op).
    pub fn mark_complete(&mut self, lesson: LessonId, now: DateTime<Utc>) -> bool {
        let changed = self.completed.insert(lesson);
        if changed {
            self.updated_at = now;
        }
        changed
    }

    /// Removes a lesson from the completed-set. Returns `false` when it was
    /// not present (idempotent no-op).
    pub fn mark_incomplete(&mut self, lesson: LessonId, now: DateTime<Utc>) -> bool {
        let changed = self.completed.remove(&lesson);
        if changed {
            self.updated_at = now;
        }
        changed
    }

    /// Percentage complete against the given lesson list.
    ///
    /// Completed ids that no longer belong to the course are ignored, so the
    /// result stays in 0..=100 even when the lesson list shrank since the
    /// progress was stored.
    #[must_use]
    pub fn percentage_for<I>(&self, lessons: I) -> u8
    where
        I: IntoIterator<Item = LessonId>,
    {
        let mut total = 0_usize;
        let mut done = 0_usize;
        for id in lessons {
            total += 1;
            if self.completed.contains(&id) {
                done += 1;
            }
        }
        completion_percentage(done, total)
    }

    /// Adopts the revision returned by a successful persisted write.
    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn phone() -> PhoneNumber {
        PhoneNumber::new("+14155552671").unwrap()
    }

    fn lesson_ids(n: u64) -> Vec<LessonId> {
        (1..=n).map(LessonId::new).collect()
    }

    #[test]
    fn percentage_floors() {
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 66);
        assert_eq!(completion_percentage(3, 3), 100);
    }

    #[test]
    fn percentage_is_zero_for_empty_course() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(5, 0), 0);
    }

    #[test]
    fn percentage_is_bounded() {
        assert_eq!(completion_percentage(10, 4), 100);
        assert_eq!(completion_percentage(0, 4), 0);
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let mut progress = Progress::new(phone(), CourseId::new_random(), fixed_now());
        assert!(progress.mark_complete(LessonId::new(1), fixed_now()));
        assert!(!progress.mark_complete(LessonId::new(1), fixed_now()));
        assert_eq!(progress.completed().len(), 1);
    }

    #[test]
    fn mark_incomplete_restores_original_set() {
        let mut progress = Progress::new(phone(), CourseId::new_random(), fixed_now());
        let before = progress.completed().clone();

        assert!(progress.mark_complete(LessonId::new(3), fixed_now()));
        assert!(progress.mark_incomplete(LessonId::new(3), fixed_now()));
        assert_eq!(progress.completed(), &before);

        // removing an absent lesson is a no-op
        assert!(!progress.mark_incomplete(LessonId::new(3), fixed_now()));
    }

    #[test]
    fn two_of_four_lessons_is_fifty_percent() {
        let mut progress = Progress::new(phone(), CourseId::new_random(), fixed_now());
        progress.mark_complete(LessonId::new(1), fixed_now());
        progress.mark_complete(LessonId::new(2), fixed_now());
        assert_eq!(progress.percentage_for(lesson_ids(4)), 50);
    }

    #[test]
    fn undoing_one_of_three_is_sixty_six_percent() {
        let mut progress = Progress::new(phone(), CourseId::new_random(), fixed_now());
        for id in lesson_ids(3) {
            progress.mark_complete(id, fixed_now());
        }
        assert_eq!(progress.percentage_for(lesson_ids(3)), 100);

        progress.mark_incomplete(LessonId::new(1), fixed_now());
        assert_eq!(progress.percentage_for(lesson_ids(3)), 66);
    }

    #[test]
    fn course_without_lessons_never_completes() {
        let mut progress = Progress::new(phone(), CourseId::new_random(), fixed_now());
        progress.mark_complete(LessonId::new(99), fixed_now());
        assert_eq!(progress.percentage_for(Vec::new()), 0);
    }

    #[test]
    fn foreign_lesson_ids_do_not_count() {
        let mut progress = Progress::new(phone(), CourseId::new_random(), fixed_now());
        progress.mark_complete(LessonId::new(1), fixed_now());
        progress.mark_complete(LessonId::new(77), fixed_now());
        // lesson 77 was removed from the course; only 1 of 2 counts
        assert_eq!(progress.percentage_for(lesson_ids(2)), 50);
    }

    #[test]
    fn state_reflects_completed_set() {
        let mut progress = Progress::new(phone(), CourseId::new_random(), fixed_now());
        assert_eq!(progress.state(LessonId::new(1)), LessonState::NotStarted);
        progress.mark_complete(LessonId::new(1), fixed_now());
        assert_eq!(progress.state(LessonId::new(1)), LessonState::Completed);
        progress.mark_incomplete(LessonId::new(1), fixed_now());
        assert_eq!(progress.state(LessonId::new(1)), LessonState::NotStarted);
    }

    #[test]
    fn mutation_bumps_updated_at_only_on_change() {
        let t0 = fixed_now();
        let t1 = t0 + chrono::Duration::minutes(5);
        let mut progress = Progress::new(phone(), CourseId::new_random(), t0);

        progress.mark_complete(LessonId::new(1), t1);
        assert_eq!(progress.updated_at(), t1);

        let t2 = t1 + chrono::Duration::minutes(5);
        progress.mark_complete(LessonId::new(1), t2);
        assert_eq!(progress.updated_at(), t1);
    }
}
