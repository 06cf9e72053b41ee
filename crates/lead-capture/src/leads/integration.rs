use std::fmt::Display;

/// Failure talking to one of the outbound providers.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{provider} is not configured")]
    NotConfigured { provider: &'static str },
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} rejected the request with status {status}: {body}")]
    Rejected {
        provider: &'static str,
        status: u16,
        body: String,
    },
}

impl IntegrationError {
    pub(crate) fn transport(provider: &'static str, err: impl Display) -> Self {
        Self::Transport {
            provider,
            message: err.to_string(),
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Self::NotConfigured { provider }
            | Self::Transport { provider, .. }
            | Self::Rejected { provider, .. } => provider,
        }
    }
}

/// Read the body of a provider response and turn non-2xx statuses into errors.
pub(crate) async fn read_response(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<String, IntegrationError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| IntegrationError::transport(provider, err))?;

    tracing::debug!(provider, status = status.as_u16(), body = %body, "provider response");

    if status.is_success() {
        Ok(body)
    } else {
        Err(IntegrationError::Rejected {
            provider,
            status: status.as_u16(),
            body,
        })
    }
}
