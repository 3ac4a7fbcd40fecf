use portal_core::model::{PhoneNumber, User};

use super::records::UserRow;
use super::{RestRepository, check_status, http_err};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for RestRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let resp = self
            .client()
            .post(self.table_url("users"))
            .json(&[UserRow::from_user(user)])
            .send()
            .await
            .map_err(http_err)?;
        check_status(resp).await?;
        Ok(())
    }

    async fn get_user(&self, phone: &PhoneNumber) -> Result<Option<User>, StorageError> {
        let resp = self
            .client()
            .get(self.table_url("users"))
            .query(&[
                ("phone", format!("eq.{}", phone.as_str())),
                ("limit", "1".to_owned()),
            ])
            .send()
            .await
            .map_err(http_err)?;
        let rows: Vec<UserRow> = check_status(resp).await?.json().await.map_err(http_err)?;

        rows.into_iter().next().map(UserRow::into_user).transpose()
    }
}
