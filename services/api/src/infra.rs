use chrono::Utc;
use lead_capture::config::AppConfig;
use lead_capture::error::AppError;
use lead_capture::leads::{
    CrmGateway, CrmNotifier, EmailGateway, InMemoryVerificationStore, LeadCaptureService,
    LoftyCrmClient, NotificationSender, ResendEmailClient, TwilioSmsClient, VerificationService,
    VerificationStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const STORE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wire provider clients from configuration into the lead capture service.
pub(crate) fn build_lead_service(
    config: &AppConfig,
    store: InMemoryVerificationStore,
) -> Result<LeadCaptureService, AppError> {
    let integrations = &config.integrations;
    let http = reqwest::Client::builder()
        .timeout(integrations.outbound_timeout)
        .build()?;

    let sms = TwilioSmsClient::from_config(http.clone(), &integrations.sms);
    if integrations.sms.credentials().is_none() {
        warn!("Twilio credentials incomplete; verification requests will fail");
    }

    let crm = LoftyCrmClient::from_config(http.clone(), &integrations.crm)
        .map(|client| Arc::new(client) as Arc<dyn CrmGateway>);
    let email = ResendEmailClient::from_config(http, &integrations.email)
        .map(|client| Arc::new(client) as Arc<dyn EmailGateway>);

    let verification = VerificationService::new(
        Arc::new(sms),
        Arc::new(store),
        config.leads.verification_ttl,
    );

    let crm = CrmNotifier::new(crm);
    let email = NotificationSender::new(email, integrations.email.from.clone());
    info!(
        crm = crm.is_configured(),
        email = email.is_configured(),
        "lead delivery providers"
    );

    Ok(LeadCaptureService::new(verification, crm, email, &config.leads))
}

/// Periodically drop verification codes nobody confirmed.
pub(crate) fn spawn_store_sweeper(store: InMemoryVerificationStore) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(STORE_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match store.purge_expired(Utc::now()) {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "expired verification codes dropped"),
                Err(err) => warn!(error = %err, "verification sweep failed"),
            }
        }
    })
}
