use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::domain::{normalize_e164, LeadData};
use super::integration::{read_response, IntegrationError};
use super::DeliveryOutcome;
use crate::config::CrmConfig;

pub const DEFAULT_LEAD_SOURCE: &str = "Squamish Neighbourhoods Guide Download";
pub const LEAD_TAGS: [&str; 2] = ["Squamish Neighbourhoods", "Website Lead"];

const PROVIDER: &str = "lofty";

/// Lead as the CRM expects it: phones normalized, tags and source attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub source: String,
    pub tags: Vec<String>,
    pub notes: String,
}

impl CrmLead {
    pub fn from_lead(lead: &LeadData) -> Self {
        let phone = normalize_e164(&lead.phone);
        Self {
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: phone.clone(),
            emails: vec![lead.email.clone()],
            phones: vec![phone],
            source: lead
                .source
                .clone()
                .unwrap_or_else(|| DEFAULT_LEAD_SOURCE.to_string()),
            tags: LEAD_TAGS.iter().map(|tag| tag.to_string()).collect(),
            notes: String::new(),
        }
    }
}

/// Swappable CRM adapter.
#[async_trait]
pub trait CrmGateway: Send + Sync {
    async fn submit_lead(&self, lead: &CrmLead) -> Result<(), IntegrationError>;
}

/// Lofty `POST /v1.0/leads` adapter.
pub struct LoftyCrmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl LoftyCrmClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns `None` when no API key is configured.
    pub fn from_config(http: reqwest::Client, config: &CrmConfig) -> Option<Self> {
        config
            .api_key
            .as_ref()
            .map(|key| Self::new(http, config.endpoint.clone(), key.clone()))
    }
}

impl fmt::Debug for LoftyCrmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoftyCrmClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CrmGateway for LoftyCrmClient {
    async fn submit_lead(&self, lead: &CrmLead) -> Result<(), IntegrationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.api_key))
            .json(lead)
            .send()
            .await
            .map_err(|err| IntegrationError::transport(PROVIDER, err))?;

        read_response(PROVIDER, response).await.map(|_| ())
    }
}

/// Forwards leads to the CRM when one is configured.
#[derive(Clone, Default)]
pub struct CrmNotifier {
    gateway: Option<Arc<dyn CrmGateway>>,
}

impl CrmNotifier {
    pub fn new(gateway: Option<Arc<dyn CrmGateway>>) -> Self {
        Self { gateway }
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    pub async fn notify(&self, lead: &LeadData) -> Result<DeliveryOutcome, IntegrationError> {
        let Some(gateway) = &self.gateway else {
            tracing::warn!("CRM API key not configured; lead not forwarded");
            return Ok(DeliveryOutcome::Skipped);
        };

        gateway.submit_lead(&CrmLead::from_lead(lead)).await?;
        tracing::info!(email = %lead.email, "lead sent to CRM");
        Ok(DeliveryOutcome::Delivered)
    }
}
