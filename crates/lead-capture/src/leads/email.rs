use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::domain::LeadData;
use super::integration::{read_response, IntegrationError};
use super::DeliveryOutcome;
use crate::config::EmailConfig;

pub const ACCESS_EMAIL_SUBJECT: &str = "Your Squamish Neighbourhood Guide 🏔️";

const PROVIDER: &str = "resend";

/// Transactional email payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl AccessEmail {
    pub fn for_lead(lead: &LeadData, from: &str) -> Self {
        Self {
            from: from.to_string(),
            to: lead.email.clone(),
            subject: ACCESS_EMAIL_SUBJECT.to_string(),
            html: render_access_email(lead),
        }
    }
}

#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send(&self, email: &AccessEmail) -> Result<(), IntegrationError>;
}

/// Resend `POST /emails` adapter.
pub struct ResendEmailClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ResendEmailClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns `None` when no API key is configured.
    pub fn from_config(http: reqwest::Client, config: &EmailConfig) -> Option<Self> {
        config
            .api_key
            .as_ref()
            .map(|key| Self::new(http, config.endpoint.clone(), key.clone()))
    }
}

impl fmt::Debug for ResendEmailClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendEmailClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmailGateway for ResendEmailClient {
    async fn send(&self, email: &AccessEmail) -> Result<(), IntegrationError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|err| IntegrationError::transport(PROVIDER, err))?;

        read_response(PROVIDER, response).await.map(|_| ())
    }
}

/// Emails the access link when an email provider is configured.
#[derive(Clone)]
pub struct NotificationSender {
    gateway: Option<Arc<dyn EmailGateway>>,
    from: String,
}

impl NotificationSender {
    pub fn new(gateway: Option<Arc<dyn EmailGateway>>, from: impl Into<String>) -> Self {
        Self {
            gateway,
            from: from.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    pub async fn send_access_email(
        &self,
        lead: &LeadData,
    ) -> Result<DeliveryOutcome, IntegrationError> {
        let Some(gateway) = &self.gateway else {
            tracing::info!(to = %lead.email, "email provider not configured; email would be sent");
            return Ok(DeliveryOutcome::Skipped);
        };

        gateway.send(&AccessEmail::for_lead(lead, &self.from)).await?;
        tracing::info!(to = %lead.email, "access email sent");
        Ok(DeliveryOutcome::Delivered)
    }
}

/// Render the guide access email for a lead.
pub fn render_access_email(lead: &LeadData) -> String {
    format!(
        r##"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f7fafc;">
  <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f7fafc; padding: 40px 20px;">
    <tr>
      <td align="center">
        <table width="600" cellpadding="0" cellspacing="0" style="background-color: white; border-radius: 10px; overflow: hidden; box-shadow: 0 4px 6px rgba(0,0,0,0.1);">
          <tr>
            <td style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 40px 30px; text-align: center;">
              <h1 style="color: white; margin: 0; font-size: 28px;">Your Squamish Neighbourhood Guide is Ready</h1>
            </td>
          </tr>
          <tr>
            <td style="padding: 40px 30px;">
              <p style="margin: 0 0 20px 0; color: #2d3748; font-size: 16px; line-height: 1.6;">Hi {first_name},</p>
              <p style="margin: 0 0 20px 0; color: #2d3748; font-size: 16px; line-height: 1.6;">Thanks for requesting the Squamish Neighbourhood Guide. Your access link is below.</p>
              <h3 style="margin: 30px 0 15px 0; color: #1a202c; font-size: 18px; font-weight: 700;">What's Inside:</h3>
              <p style="margin: 15px 0 8px 0; color: #1a202c; font-size: 16px; font-weight: 600; line-height: 1.6;">Market Intelligence</p>
              <ul style="color: #2d3748; font-size: 15px; line-height: 1.7; margin: 0 0 20px 0; padding-left: 20px;">
                <li>Q3 2025 pricing trends across all property types</li>
                <li>Single-family homes averaging $1.67M (up 15% this year)</li>
                <li>Apartment market surge of 31% in sales activity</li>
                <li>Price per square foot analysis by neighbourhood</li>
              </ul>
              <p style="margin: 15px 0 8px 0; color: #1a202c; font-size: 16px; font-weight: 600; line-height: 1.6;">18+ Neighbourhood Deep Dives</p>
              <ul style="color: #2d3748; font-size: 15px; line-height: 1.7; margin: 0 0 20px 0; padding-left: 20px;">
                <li>Britannia Beach, Valleycliffe, Downtown Squamish, Sea + Sky, University Heights, Brackendale, and 12 more</li>
                <li>Real pros and cons for each area</li>
                <li>Average pricing and inventory trends</li>
                <li>Best fit for different buyer profiles</li>
              </ul>
              <p style="margin: 15px 0 8px 0; color: #1a202c; font-size: 16px; font-weight: 600; line-height: 1.6;">Essential Local Intelligence</p>
              <ul style="color: #2d3748; font-size: 15px; line-height: 1.7; margin: 0 0 25px 0; padding-left: 20px;">
                <li>School catchment areas and ratings</li>
                <li>Best restaurants, cafes, and local hotspots</li>
                <li>Outdoor recreation access points</li>
                <li>Shopping, amenities, and transportation details</li>
                <li>New development projects and growth projections</li>
              </ul>
              <p style="margin: 0 0 25px 0; color: #2d3748; font-size: 16px; line-height: 1.6;">Whether you're comparing neighbourhoods, timing the market, or trying to understand value in different areas, this guide gives you the clarity to move forward.</p>
              <div style="text-align: center; margin: 30px 0;">
                <a href="{access_url}" style="display: inline-block; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; text-decoration: none; padding: 16px 40px; border-radius: 10px; font-weight: 600; font-size: 16px;">Access Your Guide Now</a>
              </div>
              <p style="margin: 25px 0 0 0; color: #718096; font-size: 14px; line-height: 1.6;">Bookmark this page and reference it anytime. Questions about a specific neighbourhood? Hit reply.</p>
            </td>
          </tr>
          <tr>
            <td style="background-color: #f7fafc; padding: 30px; text-align: center; border-top: 1px solid #e2e8f0;">
              <p style="margin: 0; color: #718096; font-size: 14px;">Eric Johnson | Engel &amp; V&ouml;lkers Squamish</p>
              <p style="margin: 5px 0 0 0; color: #718096; font-size: 14px;">www.corridorhomes.ca</p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>
"##,
        first_name = escape_html(&lead.first_name),
        access_url = escape_html(&lead.access_url),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
