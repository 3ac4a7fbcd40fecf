use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_core::model::{
    Course, CourseId, Lesson, LessonId, NewLesson, PhoneNumber, Progress, SupportTicket, TicketId,
    User,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("stale write: revision mismatch")]
    StaleWrite,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for per-user course progress.
///
/// Course title and user names are denormalized so the my-learning and
/// certificate pages can render without extra joins. `revision` is the
/// revision the writer last observed; a successful upsert stores and returns
/// `revision + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub user_phone: PhoneNumber,
    pub course_id: CourseId,
    pub course_title: String,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub percentage: u8,
    pub completed_lesson_ids: BTreeSet<LessonId>,
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Convert the record back into domain `Progress`.
    #[must_use]
    pub fn into_progress(self) -> Progress {
        Progress::from_persisted(
            self.user_phone,
            self.course_id,
            self.completed_lesson_ids,
            self.revision,
            self.updated_at,
        )
    }
}

/// Serializes a completed-lesson set as a JSON array of ids, the shape the
/// original deployment stored in its `completed_lessons_ids` column.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn completed_ids_to_json(ids: &BTreeSet<LessonId>) -> Result<String, StorageError> {
    serde_json::to_string(ids).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parses a JSON array of lesson ids.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the payload is not such an array.
pub fn completed_ids_from_json(raw: &str) -> Result<BTreeSet<LessonId>, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the phone or email is already
    /// registered, or other storage errors.
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Fetch a user by phone number. `Ok(None)` when unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup itself fails.
    async fn get_user(&self, phone: &PhoneNumber) -> Result<Option<User>, StorageError>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist a course together with its lessons; the backend assigns lesson
    /// ids and returns them in input order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` when the course id already exists,
    /// or other storage errors.
    async fn insert_course(
        &self,
        course: &Course,
        lessons: &[NewLesson],
    ) -> Result<Vec<LessonId>, StorageError>;

    /// Fetch a course by id. `Ok(None)` when unknown.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup itself fails.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// All published courses.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Lessons of a course in playback order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn lessons_for_course(&self, id: CourseId) -> Result<Vec<Lesson>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch progress for a (user, course) pair. Absence is `Ok(None)`, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup itself fails.
    async fn get_progress(
        &self,
        phone: &PhoneNumber,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Upsert keyed by (user phone, course id), guarded by the record's
    /// revision. Returns the newly stored revision on success.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::StaleWrite` when the stored revision no longer
    /// matches `record.revision`, or other storage errors.
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<u64, StorageError>;

    /// All progress rows for one user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails.
    async fn list_progress_for_user(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Vec<ProgressRecord>, StorageError>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// File a support ticket and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the backend has no ticket table
    /// (the caller decides whether that is fatal), or other storage errors.
    async fn insert_ticket(&self, ticket: &SupportTicket) -> Result<TicketId, StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<PhoneNumber, User>>>,
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    lessons: Arc<Mutex<HashMap<CourseId, Vec<Lesson>>>>,
    progress: Arc<Mutex<HashMap<(PhoneNumber, CourseId), ProgressRecord>>>,
    tickets: Arc<Mutex<Vec<SupportTicket>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(guard: &Arc<Mutex<T>>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
        guard
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut users = Self::lock(&self.users)?;
        let duplicate = users
            .values()
            .any(|u| u.phone() == user.phone() || u.email() == user.email());
        if duplicate {
            return Err(StorageError::Conflict);
        }
        users.insert(user.phone().clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, phone: &PhoneNumber) -> Result<Option<User>, StorageError> {
        let users = Self::lock(&self.users)?;
        Ok(users.get(phone).cloned())
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_course(
        &self,
        course: &Course,
        lessons: &[NewLesson],
    ) -> Result<Vec<LessonId>, StorageError> {
        let mut courses = Self::lock(&self.courses)?;
        if courses.contains_key(&course.id()) {
            return Err(StorageError::Conflict);
        }
        let mut all_lessons = Self::lock(&self.lessons)?;

        let next_id = all_lessons
            .values()
            .flatten()
            .map(|l| l.id().value())
            .max()
            .unwrap_or(0);
        let stored: Vec<Lesson> = lessons
            .iter()
            .enumerate()
            .map(|(i, new)| {
                Lesson::from_parts(
                    LessonId::new(next_id + 1 + i as u64),
                    course.id(),
                    new.clone(),
                )
            })
            .collect();
        let ids = stored.iter().map(Lesson::id).collect();

        courses.insert(course.id(), course.clone());
        all_lessons.insert(course.id(), stored);
        Ok(ids)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let courses = Self::lock(&self.courses)?;
        Ok(courses.get(&id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let courses = Self::lock(&self.courses)?;
        let mut all: Vec<Course> = courses.values().cloned().collect();
        all.sort_by(|a, b| a.created_at().cmp(&b.created_at()));
        Ok(all)
    }

    async fn lessons_for_course(&self, id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let all_lessons = Self::lock(&self.lessons)?;
        let mut found = all_lessons.get(&id).cloned().unwrap_or_default();
        portal_core::model::sort_by_order(&mut found);
        Ok(found)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        phone: &PhoneNumber,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let progress = Self::lock(&self.progress)?;
        Ok(progress.get(&(phone.clone(), course_id)).cloned())
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<u64, StorageError> {
        let mut progress = Self::lock(&self.progress)?;
        let key = (record.user_phone.clone(), record.course_id);
        let stored_revision = progress.get(&key).map_or(0, |r| r.revision);
        if stored_revision != record.revision {
            return Err(StorageError::StaleWrite);
        }

        let new_revision = record.revision + 1;
        let mut stored = record.clone();
        stored.revision = new_revision;
        progress.insert(key, stored);
        Ok(new_revision)
    }

    async fn list_progress_for_user(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let progress = Self::lock(&self.progress)?;
        let mut rows: Vec<ProgressRecord> = progress
            .values()
            .filter(|r| &r.user_phone == phone)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(rows)
    }
}

#[async_trait]
impl TicketRepository for InMemoryRepository {
    async fn insert_ticket(&self, ticket: &SupportTicket) -> Result<TicketId, StorageError> {
        let mut tickets = Self::lock(&self.tickets)?;
        tickets.push(ticket.clone());
        Ok(TicketId::new(tickets.len() as u64))
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the portal repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub tickets: Arc<dyn TicketRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let tickets: Arc<dyn TicketRepository> = Arc::new(repo);
        Self {
            users,
            courses,
            progress,
            tickets,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::VideoId;
    use portal_core::time::fixed_now;

    fn phone() -> PhoneNumber {
        PhoneNumber::new("+14155552671").unwrap()
    }

    fn build_course(title: &str) -> (Course, Vec<NewLesson>) {
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
        let lessons = vec![
            NewLesson::new("One", "d", VideoId::new("v1").unwrap(), 1, 5).unwrap(),
            NewLesson::new("Two", "d", VideoId::new("v2").unwrap(), 2, 5).unwrap(),
        ];
        (course, lessons)
    }

    fn record(course_id: CourseId, revision: u64) -> ProgressRecord {
        ProgressRecord {
            user_phone: phone(),
            course_id,
            course_title: "Course".to_owned(),
            user_first_name: Some("Asha".to_owned()),
            user_last_name: Some("Nair".to_owned()),
            percentage: 50,
            completed_lesson_ids: BTreeSet::from([LessonId::new(1)]),
            revision,
            updated_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn insert_course_assigns_distinct_lesson_ids() {
        let repo = InMemoryRepository::new();
        let (course, lessons) = build_course("A");
        let ids = repo.insert_course(&course, &lessons).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let fetched = repo.lessons_for_course(course.id()).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].order(), 1);
    }

    #[tokio::test]
    async fn duplicate_course_id_conflicts() {
        let repo = InMemoryRepository::new();
        let (course, lessons) = build_course("A");
        repo.insert_course(&course, &lessons).await.unwrap();
        let err = repo.insert_course(&course, &lessons).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn missing_progress_reads_as_none() {
        let repo = InMemoryRepository::new();
        let found = repo
            .get_progress(&phone(), CourseId::new_random())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn upsert_progress_bumps_revision() {
        let repo = InMemoryRepository::new();
        let course_id = CourseId::new_random();

        let rev = repo.upsert_progress(&record(course_id, 0)).await.unwrap();
        assert_eq!(rev, 1);

        let rev = repo.upsert_progress(&record(course_id, 1)).await.unwrap();
        assert_eq!(rev, 2);
    }

    #[tokio::test]
    async fn stale_writer_is_rejected() {
        let repo = InMemoryRepository::new();
        let course_id = CourseId::new_random();

        repo.upsert_progress(&record(course_id, 0)).await.unwrap();
        // a second writer that also loaded revision 0
        let err = repo.upsert_progress(&record(course_id, 0)).await.unwrap_err();
        assert!(matches!(err, StorageError::StaleWrite));
    }

    #[test]
    fn completed_ids_json_roundtrip() {
        let ids = BTreeSet::from([LessonId::new(3), LessonId::new(1)]);
        let json = completed_ids_to_json(&ids).unwrap();
        assert_eq!(json, "[1,3]");
        assert_eq!(completed_ids_from_json(&json).unwrap(), ids);
    }

    #[test]
    fn completed_ids_json_rejects_garbage() {
        assert!(completed_ids_from_json("{\"not\":\"a list\"}").is_err());
    }
}
