use std::sync::Arc;

use portal_core::model::{PhoneNumber, Pin, User};
use storage::repository::{StorageError, UserRepository};

use crate::Clock;
use crate::error::AuthError;

/// Outcome of the first login step: does this phone already have an account?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneCheck {
    /// Known phone; show the PIN login form.
    Known,
    /// Unknown phone; show the signup form.
    Unknown,
}

/// An authenticated portal session.
///
/// This is what pages keep between requests; it never carries the PIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    phone: PhoneNumber,
    first_name: String,
    last_name: String,
}

impl Session {
    fn for_user(user: &User) -> Self {
        Self {
            phone: user.phone().clone(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
        }
    }

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
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Raw signup form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pin: String,
    pub confirm_pin: String,
}

/// Phone + PIN authentication over the user repository.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// First login step: decide between the login and signup forms.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::User` for a malformed phone number and
    /// `AuthError::Storage` if the lookup fails.
    pub async fn check_phone(&self, raw_phone: &str) -> Result<PhoneCheck, AuthError> {
        let phone = PhoneNumber::new(raw_phone)?;
        match self.users.get_user(&phone).await? {
            Some(_) => Ok(PhoneCheck::Known),
            None => Ok(PhoneCheck::Unknown),
        }
    }

    /// Register a new account and open a session for it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PinMismatch` when the confirmation differs,
    /// `AuthError::User` for field validation failures, and
    /// `AuthError::AlreadyRegistered` when phone or email is taken.
    pub async fn sign_up(&self, form: SignupForm) -> Result<Session, AuthError> {
        if form.pin.trim() != form.confirm_pin.trim() {
            return Err(AuthError::PinMismatch);
        }

        let user = User::new(
            PhoneNumber::new(&form.phone)?,
            form.first_name,
            form.last_name,
            form.email,
            Pin::new(&form.pin)?,
            self.clock.now(),
        )?;

        match self.users.insert_user(&user).await {
            Ok(()) => Ok(Session::for_user(&user)),
            Err(StorageError::Conflict) => Err(AuthError::AlreadyRegistered),
            Err(e) => Err(e.into()),
        }
    }

    /// Log in with phone and PIN.
    ///
    /// An unknown phone and a wrong PIN both answer `InvalidCredentials`, so
    /// a failed login does not reveal which half was wrong.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` or a wrapped storage error.
    pub async fn log_in(&self, raw_phone: &str, pin: &str) -> Result<Session, AuthError> {
        let phone = PhoneNumber::new(raw_phone).map_err(|_| AuthError::InvalidCredentials)?;
        let Some(user) = self.users.get_user(&phone).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !user.pin().matches(pin) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Session::for_user(&user))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service() -> AuthService {
        AuthService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()))
    }

    fn form(phone: &str) -> SignupForm {
        SignupForm {
            phone: phone.to_owned(),
            first_name: "Asha".to_owned(),
            last_name: "Nair".to_owned(),
            email: format!("asha{}@example.com", phone.len()),
            pin: "1234".to_owned(),
            confirm_pin: "1234".to_owned(),
        }
    }

    #[tokio::test]
    async fn unknown_phone_routes_to_signup() {
        let auth = service();
        let check = auth.check_phone("+14155552671").await.unwrap();
        assert_eq!(check, PhoneCheck::Unknown);
    }

    #[tokio::test]
    async fn known_phone_routes_to_login() {
        let auth = service();
        auth.sign_up(form("+14155552671")).await.unwrap();
        let check = auth.check_phone("+14155552671").await.unwrap();
        assert_eq!(check, PhoneCheck::Known);
    }

    #[tokio::test]
    async fn malformed_phone_is_rejected_up_front() {
        let auth = service();
        let err = auth.check_phone("12").await.unwrap_err();
        assert!(matches!(err, AuthError::User(_)));
    }

    #[tokio::test]
    async fn signup_opens_a_session() {
        let auth = service();
        let session = auth.sign_up(form("+14155552671")).await.unwrap();
        assert_eq!(session.display_name(), "Asha Nair");
        assert_eq!(session.phone().as_str(), "+14155552671");
    }

    #[tokio::test]
    async fn signup_requires_matching_pins() {
        let auth = service();
        let mut bad = form("+14155552671");
        bad.confirm_pin = "4321".to_owned();
        let err = auth.sign_up(bad).await.unwrap_err();
        assert!(matches!(err, AuthError::PinMismatch));
    }

    #[tokio::test]
    async fn signup_rejects_malformed_pin() {
        let auth = service();
        let mut bad = form("+14155552671");
        bad.pin = "12ab".to_owned();
        bad.confirm_pin = "12ab".to_owned();
        let err = auth.sign_up(bad).await.unwrap_err();
        assert!(matches!(err, AuthError::User(_)));
    }

    #[tokio::test]
    async fn duplicate_signup_is_reported() {
        let auth = service();
        auth.sign_up(form("+14155552671")).await.unwrap();
        let err = auth.sign_up(form("+14155552671")).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered));
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_pin() {
        let auth = service();
        auth.sign_up(form("+14155552671")).await.unwrap();
        let session = auth.log_in("+14155552671", "1234").await.unwrap();
        assert_eq!(session.first_name(), "Asha");
    }

    #[tokio::test]
    async fn wrong_pin_and_unknown_phone_answer_alike() {
        let auth = service();
        auth.sign_up(form("+14155552671")).await.unwrap();

        let err = auth.log_in("+14155552671", "0000").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth.log_in("+15005550000", "1234").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
