//! Wire rows for the hosted backend's tables.

use chrono::{DateTime, Utc};
use portal_core::model::{
    Course, CourseId, Lesson, LessonId, PhoneNumber, Pin, SupportTicket, User, VideoId,
};
use serde::{Deserialize, Serialize};

use crate::repository::{
    completed_ids_from_json, completed_ids_to_json, ProgressRecord, StorageError,
};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserRow {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pin: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn from_user(user: &User) -> Self {
        Self {
            phone: user.phone().as_str().to_owned(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            email: user.email().to_owned(),
            pin: user.pin().as_str().to_owned(),
            created_at: user.created_at(),
        }
    }

    pub fn into_user(self) -> Result<User, StorageError> {
        User::new(
            PhoneNumber::new(&self.phone).map_err(ser)?,
            self.first_name,
            self.last_name,
            self.email,
            Pin::new(&self.pin).map_err(ser)?,
            self.created_at,
        )
        .map_err(ser)
    }
}

//
// ─── COURSES / LESSONS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CourseRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub language: String,
    pub owner: String,
    pub learning_points: Vec<String>,
    pub thumbnail_video_id: Option<String>,
    pub duration_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CourseRow {
    pub fn from_course(course: &Course) -> Self {
        Self {
            id: course.id().to_string(),
            title: course.title().to_owned(),
            description: course.description().to_owned(),
            category: course.category().to_owned(),
            language: course.language().to_owned(),
            owner: course.owner().to_owned(),
            learning_points: course.learning_points().to_vec(),
            thumbnail_video_id: course.thumbnail().map(|v| v.as_str().to_owned()),
            duration_text: course.duration_text().map(str::to_owned),
            created_at: course.created_at(),
        }
    }

    pub fn into_course(self) -> Result<Course, StorageError> {
        let thumbnail = self
            .thumbnail_video_id
            .map(VideoId::new)
            .transpose()
            .map_err(ser)?;
        Course::new(
            self.id.parse::<CourseId>().map_err(ser)?,
            self.title,
            self.description,
            self.category,
            self.language,
            self.owner,
            self.learning_points,
            thumbnail,
            self.duration_text,
            self.created_at,
        )
        .map_err(ser)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LessonRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub video_id: String,
    pub position: i64,
    pub duration_mins: i64,
}

impl LessonRow {
    pub fn into_lesson(self) -> Result<Lesson, StorageError> {
        let id = self.id.ok_or_else(|| {
            StorageError::Serialization("lesson row without id".into())
        })?;
        let id = u64::try_from(id).map_err(|_| {
            StorageError::Serialization("lesson id sign overflow".into())
        })?;
        Lesson::new(
            LessonId::new(id),
            self.course_id.parse::<CourseId>().map_err(ser)?,
            self.title,
            self.description,
            VideoId::new(self.video_id).map_err(ser)?,
            u32::try_from(self.position)
                .map_err(|_| StorageError::Serialization("invalid position".into()))?,
            u32::try_from(self.duration_mins)
                .map_err(|_| StorageError::Serialization("invalid duration".into()))?,
        )
        .map_err(ser)
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProgressRow {
    pub user_phone: String,
    pub course_id: String,
    pub course_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_last_name: Option<String>,
    pub percentage: i64,
    /// JSON-encoded array of lesson ids, stored as text.
    pub completed_lesson_ids: String,
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRow {
    /// Builds the row to write, already carrying the post-write revision.
    pub fn for_write(record: &ProgressRecord, new_revision: u64) -> Result<Self, StorageError> {
        Ok(Self {
            user_phone: record.user_phone.as_str().to_owned(),
            course_id: record.course_id.to_string(),
            course_title: record.course_title.clone(),
            user_first_name: record.user_first_name.clone(),
            user_last_name: record.user_last_name.clone(),
            percentage: i64::from(record.percentage),
            completed_lesson_ids: completed_ids_to_json(&record.completed_lesson_ids)?,
            revision: i64::try_from(new_revision)
                .map_err(|_| StorageError::Serialization("revision overflow".into()))?,
            updated_at: record.updated_at,
        })
    }

    pub fn into_record(self) -> Result<ProgressRecord, StorageError> {
        Ok(ProgressRecord {
            user_phone: PhoneNumber::new(&self.user_phone).map_err(ser)?,
            course_id: self.course_id.parse::<CourseId>().map_err(ser)?,
            course_title: self.course_title,
            user_first_name: self.user_first_name,
            user_last_name: self.user_last_name,
            percentage: u8::try_from(self.percentage)
                .map_err(|_| StorageError::Serialization("invalid percentage".into()))?,
            completed_lesson_ids: completed_ids_from_json(&self.completed_lesson_ids)?,
            revision: u64::try_from(self.revision)
                .map_err(|_| StorageError::Serialization("revision sign overflow".into()))?,
            updated_at: self.updated_at,
        })
    }
}

//
// ─── TICKETS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TicketRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_phone: String,
    pub user_name: String,
    pub subject: String,
    pub priority: String,
    pub message: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_mime: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TicketRow {
    pub fn from_ticket(ticket: &SupportTicket) -> Result<Self, StorageError> {
        let attachment_size = ticket
            .attachment()
            .map(|a| i64::try_from(a.size_bytes()))
            .transpose()
            .map_err(|_| StorageError::Serialization("attachment size overflow".into()))?;
        Ok(Self {
            id: None,
            user_phone: ticket.user_phone().as_str().to_owned(),
            user_name: ticket.user_name().to_owned(),
            subject: ticket.subject().to_owned(),
            priority: ticket.priority().as_str().to_owned(),
            message: ticket.message().to_owned(),
            status: ticket.status().as_str().to_owned(),
            attachment_name: ticket.attachment().map(|a| a.file_name().to_owned()),
            attachment_size,
            attachment_mime: ticket.attachment().map(|a| a.mime_type().to_owned()),
            created_at: ticket.created_at(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::time::fixed_now;
    use std::collections::BTreeSet;

    #[test]
    fn user_row_roundtrips() {
        let user = User::new(
            PhoneNumber::new("+14155552671").unwrap(),
            "Asha",
            "Nair",
            "asha@example.com",
            Pin::new("1234").unwrap(),
            fixed_now(),
        )
        .unwrap();

        let row = UserRow::from_user(&user);
        assert_eq!(row.into_user().unwrap(), user);
    }

    #[test]
    fn progress_row_keeps_completed_ids_as_json_text() {
        let record = ProgressRecord {
            user_phone: PhoneNumber::new("+14155552671").unwrap(),
            course_id: CourseId::new_random(),
            course_title: "Course".to_owned(),
            user_first_name: None,
            user_last_name: None,
            percentage: 50,
            completed_lesson_ids: BTreeSet::from([LessonId::new(2), LessonId::new(9)]),
            revision: 3,
            updated_at: fixed_now(),
        };

        let row = ProgressRow::for_write(&record, 4).unwrap();
        assert_eq!(row.completed_lesson_ids, "[2,9]");
        assert_eq!(row.revision, 4);

        let back = row.into_record().unwrap();
        assert_eq!(back.completed_lesson_ids, record.completed_lesson_ids);
        assert_eq!(back.revision, 4);
    }

    #[test]
    fn lesson_row_requires_id_on_read() {
        let row = LessonRow {
            id: None,
            course_id: CourseId::new_random().to_string(),
            title: "T".to_owned(),
            description: "D".to_owned(),
            video_id: "v".to_owned(),
            position: 1,
            duration_mins: 5,
        };
        assert!(matches!(
            row.into_lesson(),
            Err(StorageError::Serialization(_))
        ));
    }
}
