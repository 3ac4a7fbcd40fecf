use std::collections::BTreeSet;

use portal_core::model::{
    Course, CourseId, LessonId, NewLesson, PhoneNumber, Pin, SupportTicket, TicketPriority, User,
    VideoId,
};
use portal_core::time::fixed_now;
use storage::repository::{
    CourseRepository, ProgressRecord, ProgressRepository, StorageError, TicketRepository,
    UserRepository,
};
use storage::sqlite::SqliteRepository;

fn phone() -> PhoneNumber {
    PhoneNumber::new("+911234567890").unwrap()
}

fn build_course(title: &str) -> (Course, Vec<NewLesson>) {
    let course = Course::new(
        CourseId::new_random(),
        title,
        "A hands-on introduction.",
        "Programming",
        "English",
        "Demo Academy",
        vec!["Point one".to_owned(), "Point two".to_owned()],
        Some(VideoId::new("vid001").unwrap()),
        Some("30 min".to_owned()),
        fixed_now(),
    )
    .unwrap();
    let lessons = vec![
        NewLesson::new("Setup", "Install things", VideoId::new("vid001").unwrap(), 1, 12).unwrap(),
        NewLesson::new("Basics", "First steps", VideoId::new("vid002").unwrap(), 2, 18).unwrap(),
    ];
    (course, lessons)
}

fn record(course_id: CourseId, revision: u64, completed: &[u64]) -> ProgressRecord {
    ProgressRecord {
        user_phone: phone(),
        course_id,
        course_title: "Course".to_owned(),
        user_first_name: Some("Demo".to_owned()),
        user_last_name: Some("Learner".to_owned()),
        percentage: 50,
        completed_lesson_ids: completed.iter().copied().map(LessonId::new).collect(),
        revision,
        updated_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_roundtrips_user() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_users?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = User::new(
        phone(),
        "Demo",
        "Learner",
        "demo@example.com",
        Pin::new("1234").unwrap(),
        fixed_now(),
    )
    .unwrap();
    repo.insert_user(&user).await.unwrap();

    let fetched = repo.get_user(&phone()).await.unwrap().unwrap();
    assert_eq!(fetched, user);

    let unknown = PhoneNumber::new("+15005550000").unwrap();
    assert!(repo.get_user(&unknown).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_rejects_duplicate_registration() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_dup_users?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = User::new(
        phone(),
        "Demo",
        "Learner",
        "demo@example.com",
        Pin::new("1234").unwrap(),
        fixed_now(),
    )
    .unwrap();
    repo.insert_user(&user).await.unwrap();

    let err = repo.insert_user(&user).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    // same email under a different phone is still a conflict
    let other = User::new(
        PhoneNumber::new("+15005550000").unwrap(),
        "Other",
        "Person",
        "demo@example.com",
        Pin::new("9999").unwrap(),
        fixed_now(),
    )
    .unwrap();
    let err = repo.insert_user(&other).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_roundtrips_course_with_ordered_lessons() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_courses?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let (course, lessons) = build_course("Rust from Zero");
    let ids = repo.insert_course(&course, &lessons).await.unwrap();
    assert_eq!(ids.len(), 2);

    let fetched = repo.get_course(course.id()).await.unwrap().unwrap();
    assert_eq!(fetched, course);
    assert_eq!(fetched.learning_points().len(), 2);

    let fetched_lessons = repo.lessons_for_course(course.id()).await.unwrap();
    assert_eq!(fetched_lessons.len(), 2);
    assert_eq!(fetched_lessons[0].order(), 1);
    assert_eq!(fetched_lessons[1].order(), 2);
    assert_eq!(fetched_lessons[0].id(), ids[0]);
    assert_eq!(fetched_lessons[0].video().as_str(), "vid001");

    let all = repo.list_courses().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn sqlite_progress_upsert_and_reload() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let (course, lessons) = build_course("Tracked Course");
    repo.insert_course(&course, &lessons).await.unwrap();

    // no record yet reads as None, not an error
    assert!(repo
        .get_progress(&phone(), course.id())
        .await
        .unwrap()
        .is_none());

    let rev = repo
        .upsert_progress(&record(course.id(), 0, &[1]))
        .await
        .unwrap();
    assert_eq!(rev, 1);

    let stored = repo
        .get_progress(&phone(), course.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.revision, 1);
    assert_eq!(
        stored.completed_lesson_ids,
        BTreeSet::from([LessonId::new(1)])
    );

    let rev = repo
        .upsert_progress(&record(course.id(), 1, &[1, 2]))
        .await
        .unwrap();
    assert_eq!(rev, 2);

    let rows = repo.list_progress_for_user(&phone()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].completed_lesson_ids.len(), 2);
}

#[tokio::test]
async fn sqlite_rejects_stale_progress_writers() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_stale?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let (course, lessons) = build_course("Raced Course");
    repo.insert_course(&course, &lessons).await.unwrap();

    repo.upsert_progress(&record(course.id(), 0, &[1]))
        .await
        .unwrap();

    // a second writer that also loaded "no record" loses the race
    let err = repo
        .upsert_progress(&record(course.id(), 0, &[2]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::StaleWrite));

    // and a writer holding an outdated revision loses as well
    repo.upsert_progress(&record(course.id(), 1, &[1, 2]))
        .await
        .unwrap();
    let err = repo
        .upsert_progress(&record(course.id(), 1, &[1]))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::StaleWrite));
}

#[tokio::test]
async fn sqlite_stores_tickets() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_tickets?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let ticket = SupportTicket::new(
        phone(),
        "Demo Learner",
        "Video will not load",
        TicketPriority::High,
        "Lesson 3 shows a black screen.",
        None,
        fixed_now(),
    )
    .unwrap();

    let first = repo.insert_ticket(&ticket).await.unwrap();
    let second = repo.insert_ticket(&ticket).await.unwrap();
    assert_ne!(first, second);
}
