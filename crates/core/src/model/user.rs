use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("first name cannot be empty")]
    EmptyFirstName,

    #[error("last name cannot be empty")]
    EmptyLastName,

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    #[error("phone number must be 10 to 15 digits, optionally prefixed with +")]
    InvalidPhone,
}

//
// ─── PHONE NUMBER ──────────────────────────────────────────────────────────────
//

/// E.164-shaped phone number. This is the user key across the whole system.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses and normalizes a phone number.
    ///
    /// Spaces and dashes are stripped; a single leading `+` is allowed; the
    /// remainder must be 10 to 15 digits.
    ///
    /// # Errors
    ///
    /// Returns `UserError::InvalidPhone` if the shape does not hold.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserError> {
        let compact: String = raw
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(UserError::InvalidPhone);
        }
        if !(10..=15).contains(&digits.len()) {
            return Err(UserError::InvalidPhone);
        }

        Ok(Self(compact))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhoneNumber({})", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── PIN ───────────────────────────────────────────────────────────────────────
//

/// Four-digit login PIN.
///
/// The debug representation never prints the digits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin(String);

impl Pin {
    /// Creates a `Pin`, requiring exactly 4 ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns `UserError::InvalidPin` for any other shape.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserError> {
        let raw = raw.as_ref().trim();
        if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(UserError::InvalidPin);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Compares the PIN against a candidate entry.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate.trim()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin(****)")
    }
}

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

/// A registered learner, keyed by phone number.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    phone: PhoneNumber,
    first_name: String,
    last_name: String,
    email: String,
    pin: Pin,
    created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new `User`.
    ///
    /// Names are trimmed and must be non-empty; the email must have a
    /// non-empty local part and domain.
    ///
    /// # Errors
    ///
    /// Returns the first failing `UserError`.
    pub fn new(
        phone: PhoneNumber,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        pin: Pin,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let first_name = first_name.into().trim().to_owned();
        if first_name.is_empty() {
            return Err(UserError::EmptyFirstName);
        }
        let last_name = last_name.into().trim().to_owned();
        if last_name.is_empty() {
            return Err(UserError::EmptyLastName);
        }

        let email = email.into().trim().to_owned();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(UserError::InvalidEmail),
        }

        Ok(Self {
            phone,
            first_name,
            last_name,
            email,
            pin,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Display name shown in the portal header and on certificates.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
