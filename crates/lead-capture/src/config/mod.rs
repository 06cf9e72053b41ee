use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Placeholder used when no guide URL is configured.
pub const PLACEHOLDER_GUIDE_URL: &str = "YOUR_GAMMA_URL_HERE";

const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
const DEFAULT_LOFTY_API_URL: &str = "https://api.lofty.com/v1.0/leads";
const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_EMAIL_FROM: &str = "Squamish Real Estate <noreply@mail.corridorhomes.ca>";
const DEFAULT_VERIFICATION_TTL_SECS: u32 = 600;
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 10;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub integrations: IntegrationConfig,
    pub leads: LeadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let outbound_timeout_secs = parse_number(
            "OUTBOUND_TIMEOUT_SECS",
            DEFAULT_OUTBOUND_TIMEOUT_SECS,
        )?;
        let integrations = IntegrationConfig {
            sms: SmsConfig {
                account_sid: optional_var("TWILIO_ACCOUNT_SID"),
                auth_token: optional_var("TWILIO_AUTH_TOKEN"),
                sender_number: optional_var("TWILIO_PHONE_NUMBER"),
                api_base: optional_var("TWILIO_API_BASE")
                    .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string()),
            },
            crm: CrmConfig {
                api_key: optional_var("LOFTY_API_KEY"),
                endpoint: optional_var("LOFTY_API_URL")
                    .unwrap_or_else(|| DEFAULT_LOFTY_API_URL.to_string()),
            },
            email: EmailConfig {
                api_key: optional_var("RESEND_API_KEY"),
                endpoint: optional_var("RESEND_API_URL")
                    .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),
                from: optional_var("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            },
            outbound_timeout: Duration::from_secs(outbound_timeout_secs),
        };

        let ttl_secs = parse_number("VERIFICATION_TTL_SECS", DEFAULT_VERIFICATION_TTL_SECS)?;
        let echo_verification_code = match optional_var("VERIFICATION_ECHO_CODE") {
            Some(raw) => parse_flag("VERIFICATION_ECHO_CODE", &raw)?,
            None => !environment.is_production(),
        };

        let leads = LeadConfig {
            guide_url: optional_var("GAMMA_URL")
                .unwrap_or_else(|| PLACEHOLDER_GUIDE_URL.to_string()),
            verification_ttl: chrono::Duration::seconds(i64::from(ttl_secs)),
            echo_verification_code,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: matches!(environment, AppEnvironment::Development),
            },
            integrations,
            leads,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Log filter and formatting controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Credentials and endpoints for the outbound providers.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub sms: SmsConfig,
    pub crm: CrmConfig,
    pub email: EmailConfig,
    pub outbound_timeout: Duration,
}

/// Twilio account settings. All three credentials are needed to send.
#[derive(Clone)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub sender_number: Option<String>,
    pub api_base: String,
}

impl SmsConfig {
    pub fn credentials(&self) -> Option<SmsCredentials> {
        Some(SmsCredentials {
            account_sid: self.account_sid.clone()?,
            auth_token: self.auth_token.clone()?,
            sender_number: self.sender_number.clone()?,
        })
    }
}

impl fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("sender_number", &self.sender_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Complete Twilio credential set.
#[derive(Clone)]
pub struct SmsCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub sender_number: String,
}

impl fmt::Debug for SmsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsCredentials")
            .field("account_sid", &self.account_sid)
            .field("sender_number", &self.sender_number)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct CrmConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub from: String,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("from", &self.from)
            .finish()
    }
}

/// Lead workflow settings: where access links point and how codes behave.
#[derive(Debug, Clone)]
pub struct LeadConfig {
    pub guide_url: String,
    pub verification_ttl: chrono::Duration,
    pub echo_verification_code: bool,
}

impl LeadConfig {
    pub fn uses_placeholder_guide(&self) -> bool {
        self.guide_url == PLACEHOLDER_GUIDE_URL
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        None => Ok(default),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative whole number")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
