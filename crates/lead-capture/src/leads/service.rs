use tokio::task::JoinError;

use super::crm::CrmNotifier;
use super::domain::{CodeConfirmation, LeadData, LeadSubmission, MissingLeadFields, VerificationRequest};
use super::email::NotificationSender;
use super::integration::IntegrationError;
use super::token::{access_url, AccessToken};
use super::verification::{IssuedCode, VerificationError, VerificationService};
use super::DeliveryOutcome;
use crate::config::LeadConfig;

/// Service composing verification, token issuance, and lead hand-off.
#[derive(Clone)]
pub struct LeadCaptureService {
    verification: VerificationService,
    crm: CrmNotifier,
    email: NotificationSender,
    guide_url: String,
    echo_verification_code: bool,
}

impl LeadCaptureService {
    pub fn new(
        verification: VerificationService,
        crm: CrmNotifier,
        email: NotificationSender,
        config: &LeadConfig,
    ) -> Self {
        Self {
            verification,
            crm,
            email,
            guide_url: config.guide_url.clone(),
            echo_verification_code: config.echo_verification_code,
        }
    }

    /// Whether verification responses carry the issued code back to the caller.
    pub fn echoes_verification_code(&self) -> bool {
        self.echo_verification_code
    }

    pub async fn send_verification(
        &self,
        request: VerificationRequest,
    ) -> Result<IssuedCode, VerificationError> {
        let phone = request.phone_number()?;
        let issued = self.verification.send_code(phone).await?;
        tracing::info!(expires_at = %issued.expires_at, "verification code sent");
        Ok(issued)
    }

    pub fn confirm_verification(
        &self,
        confirmation: CodeConfirmation,
    ) -> Result<(), VerificationError> {
        let phone = VerificationRequest {
            phone: confirmation.phone,
        }
        .phone_number()?;
        let code = confirmation.code.ok_or(VerificationError::MissingCode)?;
        self.verification.confirm_code(&phone, &code)
    }

    /// Issue an access link and hand the lead to the CRM and email provider.
    ///
    /// Both deliveries run as independent tasks and are awaited together. Their
    /// failures are logged and recorded on the receipt but never fail the
    /// submission: the caller always gets the access link. Only a task that
    /// fails to complete at all is reported as an error.
    pub async fn submit_lead(
        &self,
        submission: LeadSubmission,
    ) -> Result<LeadReceipt, LeadWorkflowError> {
        let contact = submission.into_contact()?;
        let access_token = AccessToken::generate();
        let access_url = access_url(&self.guide_url, &access_token);
        let lead = LeadData::new(contact, access_token, access_url);

        let crm_task = {
            let notifier = self.crm.clone();
            let lead = lead.clone();
            tokio::spawn(async move { notifier.notify(&lead).await })
        };
        let email_task = {
            let sender = self.email.clone();
            let lead = lead.clone();
            tokio::spawn(async move { sender.send_access_email(&lead).await })
        };

        let (crm, email) = tokio::join!(crm_task, email_task);
        let crm = settle("crm", crm?);
        let email = settle("email", email?);

        tracing::info!(?crm, ?email, "lead processed");
        Ok(LeadReceipt {
            access_token: lead.access_token,
            access_url: lead.access_url,
            crm,
            email,
        })
    }
}

fn settle(
    channel: &'static str,
    result: Result<DeliveryOutcome, IntegrationError>,
) -> DeliveryOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(channel, provider = err.provider(), error = %err, "lead delivery failed");
            DeliveryOutcome::Failed
        }
    }
}

/// Result of a processed lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadReceipt {
    pub access_token: AccessToken,
    pub access_url: String,
    pub crm: DeliveryOutcome,
    pub email: DeliveryOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum LeadWorkflowError {
    #[error(transparent)]
    MissingFields(#[from] MissingLeadFields),
    #[error("delivery task did not complete: {0}")]
    Task(#[from] JoinError),
}
