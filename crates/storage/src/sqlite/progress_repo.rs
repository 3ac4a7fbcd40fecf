use portal_core::model::{CourseId, PhoneNumber};

use super::SqliteRepository;
use super::mapping::{db_err, map_progress_row};
use crate::repository::{completed_ids_to_json, ProgressRecord, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        phone: &PhoneNumber,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_phone, course_id, course_title, user_first_name, user_last_name, percentage, completed_lesson_ids, revision, updated_at
            FROM progress
            WHERE user_phone = ?1 AND course_id = ?2
            ",
        )
        .bind(phone.as_str())
        .bind(course_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => map_progress_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<u64, StorageError> {
        let completed = completed_ids_to_json(&record.completed_lesson_ids)?;
        let expected = i64::try_from(record.revision)
            .map_err(|_| StorageError::Serialization("revision overflow".into()))?;

        // First write inserts revision 1; later writes update only when the
        // stored revision still matches what the caller loaded.
        let rows_affected = if record.revision == 0 {
            sqlx::query(
                r"
                INSERT INTO progress (user_phone, course_id, course_title, user_first_name, user_last_name, percentage, completed_lesson_ids, revision, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
                ON CONFLICT(user_phone, course_id) DO NOTHING
                ",
            )
            .bind(record.user_phone.as_str())
            .bind(record.course_id.to_string())
            .bind(&record.course_title)
            .bind(&record.user_first_name)
            .bind(&record.user_last_name)
            .bind(i64::from(record.percentage))
            .bind(&completed)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected()
        } else {
            sqlx::query(
                r"
                UPDATE progress SET
                    course_title = ?3,
                    user_first_name = ?4,
                    user_last_name = ?5,
                    percentage = ?6,
                    completed_lesson_ids = ?7,
                    revision = revision + 1,
                    updated_at = ?8
                WHERE user_phone = ?1 AND course_id = ?2 AND revision = ?9
                ",
            )
            .bind(record.user_phone.as_str())
            .bind(record.course_id.to_string())
            .bind(&record.course_title)
            .bind(&record.user_first_name)
            .bind(&record.user_last_name)
            .bind(i64::from(record.percentage))
            .bind(&completed)
            .bind(record.updated_at)
            .bind(expected)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected()
        };

        if rows_affected == 0 {
            return Err(StorageError::StaleWrite);
        }
        Ok(record.revision + 1)
    }

    async fn list_progress_for_user(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_phone, course_id, course_title, user_first_name, user_last_name, percentage, completed_lesson_ids, revision, updated_at
            FROM progress
            WHERE user_phone = ?1
            ORDER BY updated_at ASC
            ",
        )
        .bind(phone.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_progress_row(&row)?);
        }
        Ok(records)
    }
}
