use portal_core::model::{PhoneNumber, Pin, User};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db_err, phone_from_str, ser};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (phone, first_name, last_name, email, pin, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user.phone().as_str())
        .bind(user.first_name())
        .bind(user.last_name())
        .bind(user.email())
        .bind(user.pin().as_str())
        .bind(user.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_user(&self, phone: &PhoneNumber) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT phone, first_name, last_name, email, pin, created_at
            FROM users WHERE phone = ?1
            ",
        )
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = User::new(
            phone_from_str(&row.try_get::<String, _>("phone").map_err(ser)?)?,
            row.try_get::<String, _>("first_name").map_err(ser)?,
            row.try_get::<String, _>("last_name").map_err(ser)?,
            row.try_get::<String, _>("email").map_err(ser)?,
            Pin::new(row.try_get::<String, _>("pin").map_err(ser)?).map_err(ser)?,
            row.try_get("created_at").map_err(ser)?,
        )
        .map_err(ser)?;

        Ok(Some(user))
    }
}
