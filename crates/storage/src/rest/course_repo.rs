use portal_core::model::{Course, CourseId, Lesson, LessonId, NewLesson};

use super::records::{CourseRow, LessonRow};
use super::{RestRepository, check_status, http_err};
use crate::repository::{CourseRepository, StorageError};

#[async_trait::async_trait]
impl CourseRepository for RestRepository {
    async fn insert_course(
        &self,
        course: &Course,
        lessons: &[NewLesson],
    ) -> Result<Vec<LessonId>, StorageError> {
        // Two calls; the hosted API has no cross-table transaction, same as
        // the original upload flow.
        let resp = self
            .client()
            .post(self.table_url("courses"))
            .json(&[CourseRow::from_course(course)])
            .send()
            .await
            .map_err(http_err)?;
        check_status(resp).await?;

        let lesson_rows: Vec<LessonRow> = lessons
            .iter()
            .map(|l| LessonRow {
                id: None,
                course_id: course.id().to_string(),
                title: l.title().to_owned(),
                description: l.description().to_owned(),
                video_id: l.video().as_str().to_owned(),
                position: i64::from(l.order()),
                duration_mins: i64::from(l.duration_mins()),
            })
            .collect();

        let resp = self
            .client()
            .post(self.table_url("lessons"))
            .header("Prefer", "return=representation")
            .json(&lesson_rows)
            .send()
            .await
            .map_err(http_err)?;
        let inserted: Vec<LessonRow> =
            check_status(resp).await?.json().await.map_err(http_err)?;

        inserted
            .into_iter()
            .map(|row| row.into_lesson().map(|l| l.id()))
            .collect()
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let resp = self
            .client()
            .get(self.table_url("courses"))
            .query(&[
                ("id", format!("eq.{id}")),
                ("limit", "1".to_owned()),
            ])
            .send()
            .await
            .map_err(http_err)?;
        let rows: Vec<CourseRow> = check_status(resp).await?.json().await.map_err(http_err)?;

        rows.into_iter()
            .next()
            .map(CourseRow::into_course)
            .transpose()
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let resp = self
            .client()
            .get(self.table_url("courses"))
            .query(&[("order", "created_at.asc")])
            .send()
            .await
            .map_err(http_err)?;
        let rows: Vec<CourseRow> = check_status(resp).await?.json().await.map_err(http_err)?;

        rows.into_iter().map(CourseRow::into_course).collect()
    }

    async fn lessons_for_course(&self, id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let resp = self
            .client()
            .get(self.table_url("lessons"))
            .query(&[
                ("course_id", format!("eq.{id}")),
                ("order", "position.asc".to_owned()),
            ])
            .send()
            .await
            .map_err(http_err)?;
        let rows: Vec<LessonRow> = check_status(resp).await?.json().await.map_err(http_err)?;

        rows.into_iter().map(LessonRow::into_lesson).collect()
    }
}
