use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::token::AccessToken;

/// Ten-digit North American number as typed into the verification form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const LOCAL_DIGITS: usize = 10;

    pub fn parse(raw: &str) -> Result<Self, InvalidPhoneNumber> {
        if raw.chars().count() != Self::LOCAL_DIGITS {
            return Err(InvalidPhoneNumber::Length);
        }
        if !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvalidPhoneNumber::NonDigit);
        }
        Ok(Self(raw.to_string()))
    }

    /// Destination in E.164 form, always in country code 1.
    pub fn to_e164(&self) -> String {
        format!("+1{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPhoneNumber {
    #[error("phone number is required")]
    Missing,
    #[error("phone number must be exactly 10 characters")]
    Length,
    #[error("phone number may only contain digits")]
    NonDigit,
}

/// Best-effort E.164 rendering of a free-form phone string.
///
/// Ten digits are assumed to be North American; anything else is taken to
/// already carry its country code.
pub fn normalize_e164(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == PhoneNumber::LOCAL_DIGITS {
        format!("+1{digits}")
    } else {
        format!("+{digits}")
    }
}

/// Body of a `sendVerification` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VerificationRequest {
    #[serde(default)]
    pub phone: Option<String>,
}

impl VerificationRequest {
    pub fn phone_number(&self) -> Result<PhoneNumber, InvalidPhoneNumber> {
        match self.phone.as_deref() {
            None | Some("") => Err(InvalidPhoneNumber::Missing),
            Some(raw) => PhoneNumber::parse(raw),
        }
    }
}

/// Body of a `verifyCode` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CodeConfirmation {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub code: Option<String>,
}

/// Lead form as posted by the landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub timestamp: Option<String>,
}

impl LeadSubmission {
    /// Enforce the required contact fields.
    pub fn into_contact(self) -> Result<LeadContact, MissingLeadFields> {
        let mut missing = Vec::new();
        let first_name = required(self.first_name, "firstName", &mut missing);
        let last_name = required(self.last_name, "lastName", &mut missing);
        let email = required(self.email, "email", &mut missing);
        let phone = required(self.phone, "phone", &mut missing);

        match (first_name, last_name, email, phone) {
            (Some(first_name), Some(last_name), Some(email), Some(phone)) => Ok(LeadContact {
                first_name,
                last_name,
                email,
                phone,
                source: self.source.filter(|value| !value.is_empty()),
                timestamp: self.timestamp,
            }),
            _ => Err(MissingLeadFields(missing)),
        }
    }
}

fn required(
    value: Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            missing.push(field);
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .0.join(", "))]
pub struct MissingLeadFields(pub Vec<&'static str>);

/// Validated contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub source: Option<String>,
    pub timestamp: Option<String>,
}

/// Everything known about a lead once its access link has been issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub source: Option<String>,
    pub timestamp: Option<String>,
    pub access_token: AccessToken,
    pub access_url: String,
}

impl LeadData {
    pub fn new(contact: LeadContact, access_token: AccessToken, access_url: String) -> Self {
        let LeadContact {
            first_name,
            last_name,
            email,
            phone,
            source,
            timestamp,
        } = contact;

        Self {
            first_name,
            last_name,
            email,
            phone,
            source,
            timestamp,
            access_token,
            access_url,
        }
    }
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// Keep string values only; anything else reads as absent.
fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}
