use portal_core::model::{SupportTicket, TicketId};

use super::records::TicketRow;
use super::{RestRepository, check_status, http_err};
use crate::repository::{StorageError, TicketRepository};

#[async_trait::async_trait]
impl TicketRepository for RestRepository {
    async fn insert_ticket(&self, ticket: &SupportTicket) -> Result<TicketId, StorageError> {
        let resp = self
            .client()
            .post(self.table_url("support_tickets"))
            .header("Prefer", "return=representation")
            .json(&[TicketRow::from_ticket(ticket)?])
            .send()
            .await
            .map_err(http_err)?;
        // A 404 here usually means the table itself is missing; surfaced as
        // NotFound so the service layer can apply its configured fallback.
        let rows: Vec<TicketRow> = check_status(resp).await?.json().await.map_err(http_err)?;

        let id = rows
            .into_iter()
            .next()
            .and_then(|r| r.id)
            .ok_or_else(|| StorageError::Serialization("ticket row without id".into()))?;
        let id = u64::try_from(id)
            .map_err(|_| StorageError::Serialization("ticket id sign overflow".into()))?;
        Ok(TicketId::new(id))
    }
}
