use portal_core::model::{CourseId, PhoneNumber};

use super::records::ProgressRow;
use super::{RestRepository, check_status, http_err};
use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for RestRepository {
    async fn get_progress(
        &self,
        phone: &PhoneNumber,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let resp = self
            .client()
            .get(self.table_url("progress"))
            .query(&[
                ("user_phone", format!("eq.{}", phone.as_str())),
                ("course_id", format!("eq.{course_id}")),
                ("limit", "1".to_owned()),
            ])
            .send()
            .await
            .map_err(http_err)?;
        let rows: Vec<ProgressRow> = check_status(resp).await?.json().await.map_err(http_err)?;

        rows.into_iter()
            .next()
            .map(ProgressRow::into_record)
            .transpose()
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<u64, StorageError> {
        let new_revision = record.revision + 1;
        let row = ProgressRow::for_write(record, new_revision)?;

        if record.revision == 0 {
            // First write for this (user, course) pair. A conflict means a
            // competing writer created the row since we loaded.
            let resp = self
                .client()
                .post(self.table_url("progress"))
                .json(&[row])
                .send()
                .await
                .map_err(http_err)?;
            match check_status(resp).await {
                Ok(_) => Ok(new_revision),
                Err(StorageError::Conflict) => Err(StorageError::StaleWrite),
                Err(e) => Err(e),
            }
        } else {
            // Guarded update: the revision filter makes a stale writer match
            // zero rows instead of clobbering newer state.
            let resp = self
                .client()
                .patch(self.table_url("progress"))
                .header("Prefer", "return=representation")
                .query(&[
                    ("user_phone", format!("eq.{}", record.user_phone.as_str())),
                    ("course_id", format!("eq.{}", record.course_id)),
                    ("revision", format!("eq.{}", record.revision)),
                ])
                .json(&row)
                .send()
                .await
                .map_err(http_err)?;
            let updated: Vec<ProgressRow> =
                check_status(resp).await?.json().await.map_err(http_err)?;

            if updated.is_empty() {
                return Err(StorageError::StaleWrite);
            }
            Ok(new_revision)
        }
    }

    async fn list_progress_for_user(
        &self,
        phone: &PhoneNumber,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let resp = self
            .client()
            .get(self.table_url("progress"))
            .query(&[
                ("user_phone", format!("eq.{}", phone.as_str())),
                ("order", "updated_at.asc".to_owned()),
            ])
            .send()
            .await
            .map_err(http_err)?;
        let rows: Vec<ProgressRow> = check_status(resp).await?.json().await.map_err(http_err)?;

        rows.into_iter().map(ProgressRow::into_record).collect()
    }
}
