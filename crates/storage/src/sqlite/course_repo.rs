use portal_core::model::{Course, CourseId, Lesson, LessonId, NewLesson};

use super::SqliteRepository;
use super::mapping::{db_err, lesson_id_from_i64, map_course_row, map_lesson_row, ser};
use crate::repository::{CourseRepository, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_course(
        &self,
        course: &Course,
        lessons: &[NewLesson],
    ) -> Result<Vec<LessonId>, StorageError> {
        let learning_points =
            serde_json::to_string(course.learning_points()).map_err(ser)?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, description, category, language, owner, learning_points, thumbnail_video_id, duration_text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(course.id().to_string())
        .bind(course.title())
        .bind(course.description())
        .bind(course.category())
        .bind(course.language())
        .bind(course.owner())
        .bind(learning_points)
        .bind(course.thumbnail().map(|v| v.as_str().to_owned()))
        .bind(course.duration_text())
        .bind(course.created_at())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let mut ids = Vec::with_capacity(lessons.len());
        for lesson in lessons {
            let res = sqlx::query(
                r"
                INSERT INTO lessons (course_id, title, description, video_id, position, duration_mins)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(course.id().to_string())
            .bind(lesson.title())
            .bind(lesson.description())
            .bind(lesson.video().as_str())
            .bind(i64::from(lesson.order()))
            .bind(i64::from(lesson.duration_mins()))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            ids.push(lesson_id_from_i64(res.last_insert_rowid())?);
        }

        tx.commit().await.map_err(db_err)?;
        Ok(ids)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, category, language, owner, learning_points, thumbnail_video_id, duration_text, created_at
            FROM courses WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => map_course_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, category, language, owner, learning_points, thumbnail_video_id, duration_text, created_at
            FROM courses
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            courses.push(map_course_row(&row)?);
        }
        Ok(courses)
    }

    async fn lessons_for_course(&self, id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, title, description, video_id, position, duration_mins
            FROM lessons
            WHERE course_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(map_lesson_row(&row)?);
        }
        Ok(lessons)
    }
}
