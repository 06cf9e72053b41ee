use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::config::LeadConfig;
use crate::leads::{
    AccessEmail, CrmGateway, CrmLead, CrmNotifier, EmailGateway, InMemoryVerificationStore,
    IntegrationError, LeadCaptureService, LeadSubmission, NotificationSender, SmsGateway,
    VerificationService,
};

pub(super) const GUIDE_URL: &str = "https://gamma.app/docs/squamish-guide";

#[derive(Default)]
pub(super) struct RecordingSms {
    pub(super) sent: Mutex<Vec<(String, String)>>,
    pub(super) fail: bool,
}

impl RecordingSms {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sms mutex").clone()
    }
}

#[async_trait]
impl SmsGateway for RecordingSms {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), IntegrationError> {
        self.sent
            .lock()
            .expect("sms mutex")
            .push((to.to_string(), body.to_string()));
        if self.fail {
            return Err(IntegrationError::Rejected {
                provider: "twilio",
                status: 401,
                body: "authenticate".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct RecordingCrm {
    pub(super) leads: Mutex<Vec<CrmLead>>,
    pub(super) fail: bool,
}

impl RecordingCrm {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn leads(&self) -> Vec<CrmLead> {
        self.leads.lock().expect("crm mutex").clone()
    }
}

#[async_trait]
impl CrmGateway for RecordingCrm {
    async fn submit_lead(&self, lead: &CrmLead) -> Result<(), IntegrationError> {
        self.leads.lock().expect("crm mutex").push(lead.clone());
        if self.fail {
            return Err(IntegrationError::Rejected {
                provider: "lofty",
                status: 422,
                body: "{\"message\":\"invalid\"}".to_string(),
            });
        }
        Ok(())
    }
}

/// Gateway whose task never completes normally.
pub(super) struct PanickingCrm;

#[async_trait]
impl CrmGateway for PanickingCrm {
    async fn submit_lead(&self, _lead: &CrmLead) -> Result<(), IntegrationError> {
        panic!("crm gateway crashed");
    }
}

#[derive(Default)]
pub(super) struct RecordingEmail {
    pub(super) emails: Mutex<Vec<AccessEmail>>,
    pub(super) fail: bool,
}

impl RecordingEmail {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn emails(&self) -> Vec<AccessEmail> {
        self.emails.lock().expect("email mutex").clone()
    }
}

#[async_trait]
impl EmailGateway for RecordingEmail {
    async fn send(&self, email: &AccessEmail) -> Result<(), IntegrationError> {
        self.emails.lock().expect("email mutex").push(email.clone());
        if self.fail {
            return Err(IntegrationError::Transport {
                provider: "resend",
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}

/// Fakes wired into a service, kept around for assertions.
pub(super) struct Harness {
    pub(super) sms: Arc<RecordingSms>,
    pub(super) crm: Arc<RecordingCrm>,
    pub(super) email: Arc<RecordingEmail>,
    pub(super) store: InMemoryVerificationStore,
    pub(super) service: Arc<LeadCaptureService>,
}

pub(super) fn lead_config(echo_verification_code: bool) -> LeadConfig {
    LeadConfig {
        guide_url: GUIDE_URL.to_string(),
        verification_ttl: chrono::Duration::minutes(10),
        echo_verification_code,
    }
}

pub(super) fn harness_with(
    sms: RecordingSms,
    crm: RecordingCrm,
    email: RecordingEmail,
    echo_verification_code: bool,
) -> Harness {
    let sms = Arc::new(sms);
    let crm = Arc::new(crm);
    let email = Arc::new(email);
    let store = InMemoryVerificationStore::default();
    let config = lead_config(echo_verification_code);

    let verification = VerificationService::new(
        sms.clone(),
        Arc::new(store.clone()),
        config.verification_ttl,
    );
    let service = Arc::new(LeadCaptureService::new(
        verification,
        CrmNotifier::new(Some(crm.clone() as Arc<dyn CrmGateway>)),
        NotificationSender::new(
            Some(email.clone() as Arc<dyn EmailGateway>),
            "Squamish Real Estate <noreply@example.com>",
        ),
        &config,
    ));

    Harness {
        sms,
        crm,
        email,
        store,
        service,
    }
}

/// Service whose CRM delivery task panics.
pub(super) fn service_with_panicking_crm() -> Arc<LeadCaptureService> {
    let config = lead_config(true);
    let verification = VerificationService::new(
        Arc::new(RecordingSms::default()),
        Arc::new(InMemoryVerificationStore::default()),
        config.verification_ttl,
    );
    Arc::new(LeadCaptureService::new(
        verification,
        CrmNotifier::new(Some(Arc::new(PanickingCrm) as Arc<dyn CrmGateway>)),
        NotificationSender::new(
            Some(Arc::new(RecordingEmail::default()) as Arc<dyn EmailGateway>),
            "Squamish Real Estate <noreply@example.com>",
        ),
        &config,
    ))
}

pub(super) fn harness() -> Harness {
    harness_with(
        RecordingSms::default(),
        RecordingCrm::default(),
        RecordingEmail::default(),
        true,
    )
}

pub(super) fn jane() -> LeadSubmission {
    LeadSubmission {
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        email: Some("jane@x.com".to_string()),
        phone: Some("6045551234".to_string()),
        source: None,
        timestamp: Some("2025-10-01T09:00:00Z".to_string()),
    }
}

pub(super) fn is_token_shape(raw: &str) -> bool {
    let Some((time, fragment)) = raw.split_once('-') else {
        return false;
    };
    let base36 = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
    };
    base36(time) && base36(fragment)
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
