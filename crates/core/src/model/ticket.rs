use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::user::PhoneNumber;

/// Attachment size cap, matching the upload form limit.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

const ALLOWED_ATTACHMENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TicketError {
    #[error("subject cannot be empty")]
    EmptySubject,

    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("unknown priority: {0}")]
    UnknownPriority(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("attachment exceeds the 5 MiB limit ({size} bytes)")]
    AttachmentTooLarge { size: u64 },

    #[error("attachment type not supported: {0}")]
    UnsupportedAttachmentType(String),
}

//
// ─── PRIORITY / STATUS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::UnknownPriority` for anything else.
    pub fn parse(s: &str) -> Result<Self, TicketError> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(TicketError::UnknownPriority(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::UnknownStatus` for anything else.
    pub fn parse(s: &str) -> Result<Self, TicketError> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(TicketError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── ATTACHMENT ────────────────────────────────────────────────────────────────
//

/// Metadata for a file attached to a ticket. The bytes themselves go to the
/// object store, not through this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentMeta {
    file_name: String,
    size_bytes: u64,
    mime_type: String,
}

impl AttachmentMeta {
    /// Creates attachment metadata, enforcing the size cap and MIME allowlist.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::AttachmentTooLarge` or
    /// `TicketError::UnsupportedAttachmentType`.
    pub fn new(
        file_name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
    ) -> Result<Self, TicketError> {
        if size_bytes > MAX_ATTACHMENT_BYTES {
            return Err(TicketError::AttachmentTooLarge { size: size_bytes });
        }
        let mime_type = mime_type.into();
        if !ALLOWED_ATTACHMENT_TYPES.contains(&mime_type.as_str()) {
            return Err(TicketError::UnsupportedAttachmentType(mime_type));
        }
        Ok(Self {
            file_name: file_name.into(),
            size_bytes,
            mime_type,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

//
// ─── TICKET ────────────────────────────────────────────────────────────────────
//

/// A support request submitted from the contact page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportTicket {
    user_phone: PhoneNumber,
    user_name: String,
    subject: String,
    priority: TicketPriority,
    message: String,
    status: TicketStatus,
    attachment: Option<AttachmentMeta>,
    created_at: DateTime<Utc>,
}

impl SupportTicket {
    /// Creates a new ticket in `Open` status.
    ///
    /// # Errors
    ///
    /// Returns `TicketError` if the subject or message is empty after
    /// trimming.
    pub fn new(
        user_phone: PhoneNumber,
        user_name: impl Into<String>,
        subject: impl Into<String>,
        priority: TicketPriority,
        message: impl Into<String>,
        attachment: Option<AttachmentMeta>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TicketError> {
        let subject = subject.into().trim().to_owned();
        if subject.is_empty() {
            return Err(TicketError::EmptySubject);
        }
        let message = message.into().trim().to_owned();
        if message.is_empty() {
            return Err(TicketError::EmptyMessage);
        }

        Ok(Self {
            user_phone,
            user_name: user_name.into().trim().to_owned(),
            subject,
            priority,
            message,
            status: TicketStatus::Open,
            attachment,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn user_phone(&self) -> &PhoneNumber {
        &self.user_phone
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn priority(&self) -> TicketPriority {
        self.priority
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> TicketStatus {
        self.status
    }

    #[must_use]
    pub fn attachment(&self) -> Option<&AttachmentMeta> {
        self.attachment.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
