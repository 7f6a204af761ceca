//! Phone number registration.
//!
//! Verification is a two-step exchange with an external provider: a code is sent to the phone,
//! then the code the user typed is confirmed against the handle returned by the send step. The
//! handle lives in the [`RegistrationFlow`] that requested it, so concurrent registrations never
//! share state. No concrete provider ships with this crate.

use crate::config::CoreConfig;
use crate::error::AuthError;
use async_trait::async_trait;
use medai_types::PhoneNumber;

/// Identity returned by the provider once a code is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub uid: String,
    pub phone: PhoneNumber,
}

/// Pending verification for one phone number.
#[async_trait]
pub trait Confirmation: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` if the provider rejects `code`.
    async fn confirm(&self, code: &str) -> Result<VerifiedUser, AuthError>;
}

/// Sends one-time codes.
#[async_trait]
pub trait PhoneVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `AuthError::SendFailed` if the provider could not send the code.
    async fn send_code(&self, phone: &PhoneNumber) -> Result<Box<dyn Confirmation>, AuthError>;
}

struct Pending {
    phone: PhoneNumber,
    confirmation: Box<dyn Confirmation>,
}

/// A single registration attempt.
pub struct RegistrationFlow<V> {
    verifier: V,
    country_code: String,
    pending: Option<Pending>,
}

impl<V: PhoneVerifier> RegistrationFlow<V> {
    /// Starts a flow. Bare national numbers are prefixed with `country_code`.
    pub fn start(verifier: V, country_code: impl Into<String>) -> Self {
        Self {
            verifier,
            country_code: country_code.into(),
            pending: None,
        }
    }

    /// Starts a flow using the configured default country code (`MEDAI_COUNTRY_CODE`).
    pub fn from_config(verifier: V, cfg: &CoreConfig) -> Self {
        Self::start(verifier, cfg.country_code())
    }

    /// Sends a code to `input` and remembers the confirmation handle. Sending again replaces any
    /// earlier handle, so only the most recent code can be confirmed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPhoneNumber` if `input` is not a usable number, or the
    /// provider's error if sending fails.
    pub async fn send_code(&mut self, input: &str) -> Result<PhoneNumber, AuthError> {
        let phone = PhoneNumber::with_country_code(input, &self.country_code)?;
        let confirmation = self.verifier.send_code(&phone).await.map_err(|e| {
            tracing::warn!(phone = %phone, error = %e, "failed to send verification code");
            e
        })?;

        tracing::info!(phone = %phone, "verification code sent");
        self.pending = Some(Pending {
            phone: phone.clone(),
            confirmation,
        });
        Ok(phone)
    }

    /// Confirms `code` against the last code sent.
    ///
    /// A rejected code keeps the pending confirmation so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoPendingConfirmation` if no code was sent, `AuthError::InvalidCode`
    /// for an empty or rejected code.
    pub async fn verify(&mut self, code: &str) -> Result<VerifiedUser, AuthError> {
        let pending = self
            .pending
            .as_ref()
            .ok_or(AuthError::NoPendingConfirmation)?;

        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::InvalidCode);
        }

        let user = pending.confirmation.confirm(code).await?;
        tracing::info!(phone = %pending.phone, uid = %user.uid, "phone number verified");
        self.pending = None;
        Ok(user)
    }

    /// Phone number awaiting confirmation, if any.
    pub fn pending_phone(&self) -> Option<&PhoneNumber> {
        self.pending.as_ref().map(|p| &p.phone)
    }
}
