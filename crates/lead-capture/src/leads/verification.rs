use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;

use super::domain::{InvalidPhoneNumber, PhoneNumber};
use super::integration::{read_response, IntegrationError};
use super::store::{ConfirmOutcome, PendingVerification, StoreError, VerificationStore};
use crate::config::{SmsConfig, SmsCredentials};

const PROVIDER: &str = "twilio";
const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Six-digit one-time code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Draw a code uniformly from 100000..=999999.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(CODE_MIN..=CODE_MAX).to_string())
    }

    pub fn from_digits(raw: &str) -> Option<Self> {
        let value: u32 = raw.parse().ok()?;
        (raw.len() == 6 && (CODE_MIN..=CODE_MAX).contains(&value)).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn verification_message(code: &VerificationCode) -> String {
    format!("Your Squamish Real Estate verification code is: {code}")
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `body` to an E.164 destination.
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), IntegrationError>;
}

/// Twilio Messages API adapter.
///
/// Built even without credentials; sending then fails with
/// [`IntegrationError::NotConfigured`] and no request is made.
pub struct TwilioSmsClient {
    http: reqwest::Client,
    api_base: String,
    credentials: Option<SmsCredentials>,
}

impl TwilioSmsClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        credentials: Option<SmsCredentials>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            credentials,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &SmsConfig) -> Self {
        Self::new(http, config.api_base.clone(), config.credentials())
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            account_sid
        )
    }
}

impl fmt::Debug for TwilioSmsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioSmsClient")
            .field("api_base", &self.api_base)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SmsGateway for TwilioSmsClient {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), IntegrationError> {
        let Some(credentials) = &self.credentials else {
            tracing::warn!("Twilio credentials not configured; cannot send SMS");
            return Err(IntegrationError::NotConfigured { provider: PROVIDER });
        };

        let form = [
            ("To", to),
            ("From", credentials.sender_number.as_str()),
            ("Body", body),
        ];
        let response = self
            .http
            .post(self.messages_url(&credentials.account_sid))
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|err| IntegrationError::transport(PROVIDER, err))?;

        read_response(PROVIDER, response).await.map(|_| ())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] InvalidPhoneNumber),
    #[error("verification code missing")]
    MissingCode,
    #[error("verification code rejected: {0:?}")]
    Rejected(ConfirmOutcome),
    #[error("SMS send failed: {0}")]
    Sms(#[source] IntegrationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Code issued by a successful send.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: VerificationCode,
    pub expires_at: DateTime<Utc>,
}

/// Sends one-time codes and confirms them against the store.
#[derive(Clone)]
pub struct VerificationService {
    sms: Arc<dyn SmsGateway>,
    store: Arc<dyn VerificationStore>,
    ttl: chrono::Duration,
}

impl VerificationService {
    pub fn new(
        sms: Arc<dyn SmsGateway>,
        store: Arc<dyn VerificationStore>,
        ttl: chrono::Duration,
    ) -> Self {
        Self { sms, store, ttl }
    }

    pub async fn send_code(&self, phone: PhoneNumber) -> Result<IssuedCode, VerificationError> {
        let code = VerificationCode::generate();
        self.sms
            .send_sms(&phone.to_e164(), &verification_message(&code))
            .await
            .map_err(VerificationError::Sms)?;

        let pending = PendingVerification::issue(phone, code.clone(), Utc::now(), self.ttl);
        let expires_at = pending.expires_at;
        self.store.put(pending)?;

        Ok(IssuedCode { code, expires_at })
    }

    pub fn confirm_code(&self, phone: &PhoneNumber, code: &str) -> Result<(), VerificationError> {
        if code.trim().is_empty() {
            return Err(VerificationError::MissingCode);
        }

        match self.store.confirm(phone, code, Utc::now())? {
            ConfirmOutcome::Confirmed => Ok(()),
            other => Err(VerificationError::Rejected(other)),
        }
    }
}
