//! Storefront configuration loaded from environment variables.
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) | yes | |
//! | `STOREFRONT_BASE_URL` | yes | |
//! | `STOREFRONT_HOST` | no | `127.0.0.1` |
//! | `STOREFRONT_PORT` | no | `3000` |
//! | `RESEND_API_KEY` | no | email disabled |
//! | `EMAIL_FROM` | no | `PharmaCorp Orders <orders@pharmacorp.example>` |
//! | `ORDER_NOTIFICATION_EMAIL` | no | no staff notices |
//! | `SENTRY_DSN`, `SENTRY_ENVIRONMENT` | no | Sentry off |
//! | `LOG_FORMAT` | no | `text` (`json` for structured logs) |

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_EMAIL_FROM: &str = "PharmaCorp Orders <orders@pharmacorp.example>";

/// Keys below this many bits per character are rejected.
const MIN_KEY_ENTROPY: f64 = 3.3;

/// Substrings that mark a copied-in sample value rather than a real key.
const SAMPLE_KEY_MARKERS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnvVar(&'static str),
    #[error("{0} is invalid: {1}")]
    InvalidEnvVar(&'static str, String),
    #[error("{0} rejected: {1}")]
    InsecureSecret(&'static str, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Contains the database password.
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public URL customers reach the shop on. Decides the `Secure` cookie flag.
    pub base_url: Url,
    pub email: EmailConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub log_format: LogFormat,
}

/// Outbound mail settings. `Debug` never prints the API key.
#[derive(Clone)]
pub struct EmailConfig {
    /// Resend API key. `None` disables sending.
    pub api_key: Option<SecretString>,
    pub from: String,
    /// Inbox for new-order notices and contact-form messages.
    pub notification_address: Option<String>,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .field("notification_address", &self.notification_address)
            .finish()
    }
}

impl StorefrontConfig {
    /// Read the environment, after loading `.env` when one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing, a value
    /// does not parse, or `RESEND_API_KEY` looks like a sample value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal in production.
        let _ = dotenvy::dotenv();

        let database_url = optional("STOREFRONT_DATABASE_URL")
            .or_else(|| optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or(ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

        let base_url = optional("STOREFRONT_BASE_URL")
            .ok_or(ConfigError::MissingEnvVar("STOREFRONT_BASE_URL"))?;

        Ok(Self {
            database_url,
            host: parsed("STOREFRONT_HOST", "127.0.0.1")?,
            port: parsed("STOREFRONT_PORT", "3000")?,
            base_url: Url::parse(&base_url)
                .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL", e.to_string()))?,
            email: EmailConfig::from_env()?,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            log_format: LogFormat::parse(optional("LOG_FORMAT").as_deref()),
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = optional("RESEND_API_KEY")
            .map(|key| check_api_key("RESEND_API_KEY", &key).map(|()| SecretString::from(key)))
            .transpose()?;

        Ok(Self {
            api_key,
            from: optional("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_owned()),
            notification_address: optional("ORDER_NOTIFICATION_EMAIL"),
        })
    }

    /// Email sending switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            api_key: None,
            from: DEFAULT_EMAIL_FROM.to_owned(),
            notification_address: None,
        }
    }
}

/// A set, non-blank variable.
fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `key`, or `default` when it is unset.
fn parsed<T>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    optional(key)
        .as_deref()
        .unwrap_or(default)
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key, e.to_string()))
}

/// Shannon entropy in bits per character.
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

fn check_api_key(var: &'static str, key: &str) -> Result<(), ConfigError> {
    let lower = key.to_lowercase();
    if let Some(marker) = SAMPLE_KEY_MARKERS.iter().find(|m| lower.contains(*m)) {
        return Err(ConfigError::InsecureSecret(
            var,
            format!("looks like a sample value (contains '{marker}')"),
        ));
    }

    let entropy = bits_per_char(key);
    if entropy < MIN_KEY_ENTROPY {
        return Err(ConfigError::InsecureSecret(
            var,
            format!("entropy {entropy:.2} bits/char is below {MIN_KEY_ENTROPY:.1}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration for router tests. Nothing here is ever connected to.
    pub(crate) fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/pharmacorp_test"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            email: EmailConfig::disabled(),
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn entropy_of_repeated_and_two_symbol_strings() {
        assert!(bits_per_char("aaaaaaa").abs() < f64::EPSILON);
        assert!((bits_per_char("ab") - 1.0).abs() < 0.01);
        assert!(bits_per_char("").abs() < f64::EPSILON);
    }

    #[test]
    fn real_looking_resend_key_is_accepted() {
        assert!(check_api_key("RESEND_API_KEY", "re_8fK2pQx9_Lm3TzV7wY1bNc4Hd6").is_ok());
    }

    #[test]
    fn sample_key_is_rejected() {
        let err = check_api_key("RESEND_API_KEY", "re_your-key-here").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret("RESEND_API_KEY", _)));
    }

    #[test]
    fn low_entropy_key_is_rejected() {
        assert!(check_api_key("RESEND_API_KEY", "re_aaaaaaaaaaaaaaaaaaaa").is_err());
    }

    #[test]
    fn log_format_only_switches_on_json() {
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
    }

    #[test]
    fn socket_addr_and_https_follow_config() {
        let mut config = test_config();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(!config.is_https());
        config.base_url = Url::parse("https://shop.pharmacorp.example").unwrap();
        assert!(config.is_https());
    }

    #[test]
    fn email_config_debug_hides_key() {
        let config = EmailConfig {
            api_key: Some(SecretString::from("re_super_secret_value_91x")),
            from: DEFAULT_EMAIL_FROM.to_owned(),
            notification_address: Some("orders@pharmacorp.example".to_owned()),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains("orders@pharmacorp.example"));
        assert!(!debug_output.contains("re_super_secret_value_91x"));
    }
}
