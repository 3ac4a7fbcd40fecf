use portal_core::model::{
    Course, CourseId, Lesson, LessonId, PhoneNumber, TicketId, VideoId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{completed_ids_from_json, ProgressRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn ticket_id_from_i64(v: i64) -> Result<TicketId, StorageError> {
    Ok(TicketId::new(i64_to_u64("ticket_id", v)?))
}

pub(crate) fn course_id_from_str(raw: &str) -> Result<CourseId, StorageError> {
    raw.parse::<CourseId>().map_err(ser)
}

pub(crate) fn phone_from_str(raw: &str) -> Result<PhoneNumber, StorageError> {
    PhoneNumber::new(raw).map_err(ser)
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let learning_points: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("learning_points").map_err(ser)?)
            .map_err(ser)?;

    let thumbnail = row
        .try_get::<Option<String>, _>("thumbnail_video_id")
        .map_err(ser)?
        .map(VideoId::new)
        .transpose()
        .map_err(ser)?;

    Course::new(
        course_id_from_str(&row.try_get::<String, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        row.try_get::<String, _>("category").map_err(ser)?,
        row.try_get::<String, _>("language").map_err(ser)?,
        row.try_get::<String, _>("owner").map_err(ser)?,
        learning_points,
        thumbnail,
        row.try_get::<Option<String>, _>("duration_text")
            .map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let position_i64: i64 = row.try_get("position").map_err(ser)?;
    let position = u32::try_from(position_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid position: {position_i64}")))?;

    let duration_i64: i64 = row.try_get("duration_mins").map_err(ser)?;
    let duration = u32::try_from(duration_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid duration: {duration_i64}")))?;

    Lesson::new(
        lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        course_id_from_str(&row.try_get::<String, _>("course_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        VideoId::new(row.try_get::<String, _>("video_id").map_err(ser)?).map_err(ser)?,
        position,
        duration,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let percentage_i64: i64 = row.try_get("percentage").map_err(ser)?;
    let percentage = u8::try_from(percentage_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid percentage: {percentage_i64}")))?;

    let completed_lesson_ids = completed_ids_from_json(
        &row.try_get::<String, _>("completed_lesson_ids").map_err(ser)?,
    )?;

    Ok(ProgressRecord {
        user_phone: phone_from_str(&row.try_get::<String, _>("user_phone").map_err(ser)?)?,
        course_id: course_id_from_str(&row.try_get::<String, _>("course_id").map_err(ser)?)?,
        course_title: row.try_get("course_title").map_err(ser)?,
        user_first_name: row.try_get("user_first_name").map_err(ser)?,
        user_last_name: row.try_get("user_last_name").map_err(ser)?,
        percentage,
        completed_lesson_ids,
        revision: i64_to_u64("revision", row.try_get::<i64, _>("revision").map_err(ser)?)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

/// Maps a sqlx error to the storage taxonomy, folding unique-key violations
/// into `Conflict`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}
