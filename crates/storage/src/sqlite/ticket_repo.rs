use portal_core::model::{SupportTicket, TicketId};

use super::SqliteRepository;
use super::mapping::{db_err, ticket_id_from_i64};
use crate::repository::{StorageError, TicketRepository};

#[async_trait::async_trait]
impl TicketRepository for SqliteRepository {
    async fn insert_ticket(&self, ticket: &SupportTicket) -> Result<TicketId, StorageError> {
        let attachment_size = ticket
            .attachment()
            .map(|a| i64::try_from(a.size_bytes()))
            .transpose()
            .map_err(|_| StorageError::Serialization("attachment size overflow".into()))?;

        let res = sqlx::query(
            r"
            INSERT INTO support_tickets (user_phone, user_name, subject, priority, message, status, attachment_name, attachment_size, attachment_mime, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(ticket.user_phone().as_str())
        .bind(ticket.user_name())
        .bind(ticket.subject())
        .bind(ticket.priority().as_str())
        .bind(ticket.message())
        .bind(ticket.status().as_str())
        .bind(ticket.attachment().map(|a| a.file_name().to_owned()))
        .bind(attachment_size)
        .bind(ticket.attachment().map(|a| a.mime_type().to_owned()))
        .bind(ticket.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        ticket_id_from_i64(res.last_insert_rowid())
    }
}
