//! Guide lead capture: phone verification, access links, CRM and email hand-off.

pub mod crm;
pub mod domain;
pub mod email;
pub mod integration;
pub mod router;
pub mod service;
pub mod store;
pub mod token;
pub mod verification;

#[cfg(test)]
mod tests;

pub use crm::{CrmGateway, CrmLead, CrmNotifier, LoftyCrmClient};
pub use domain::{
    normalize_e164, CodeConfirmation, InvalidPhoneNumber, LeadContact, LeadData, LeadSubmission,
    MissingLeadFields, PhoneNumber, VerificationRequest,
};
pub use email::{render_access_email, AccessEmail, EmailGateway, NotificationSender, ResendEmailClient};
pub use integration::IntegrationError;
pub use router::{lead_router, SUBMIT_LEAD_PATH};
pub use service::{LeadCaptureService, LeadReceipt, LeadWorkflowError};
pub use store::{
    ConfirmOutcome, InMemoryVerificationStore, PendingVerification, StoreError, VerificationStore,
};
pub use token::{access_url, AccessToken};
pub use verification::{
    IssuedCode, SmsGateway, TwilioSmsClient, VerificationCode, VerificationError,
    VerificationService,
};

/// How a best-effort delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Provider not configured.
    Skipped,
    Failed,
}
