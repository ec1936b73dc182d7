use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::domain::EmailAddress;
use crate::email_client::EmailClient;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub app: ApplicationSettings,
    pub contact: ContactSettings,
    pub email_client: EmailClientSettings,
    pub delivery: DeliverySettings,
    pub bootstrap: BootstrapSettings,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub auth_token: SecretString,
    pub timeout_ms: u64,
}

impl EmailClientSettings {
    pub fn client(self) -> Result<EmailClient, anyhow::Error> {
        let sender_email = self.sender().map_err(anyhow::Error::msg)?;
        let timeout = self.timeout();
        EmailClient::new(self.base_url, sender_email, self.auth_token, timeout)
    }

    pub fn sender(&self) -> Result<EmailAddress, String> {
        EmailAddress::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ContactSettings {
    pub operator_email: String,
    /// Escape submitted fields before they are interpolated into email bodies.
    #[serde(default)]
    pub escape_html: bool,
}

impl ContactSettings {
    pub fn operator(&self) -> Result<EmailAddress, String> {
        EmailAddress::parse(self.operator_email.clone())
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct DeliverySettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_retries: i16,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub base_backoff_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub idle_poll_secs: u64,
}

impl DeliverySettings {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_secs(self.idle_poll_secs)
    }

    /// Delay before the next attempt of a job that already failed `n_retries` times.
    pub fn backoff(&self, n_retries: i16) -> Duration {
        let exponent = n_retries.clamp(0, 16) as u32;
        Duration::from_secs(self.base_backoff_secs.saturating_mul(2u64.pow(exponent)))
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct BootstrapSettings {
    pub admin_email: String,
    pub admin_password: SecretString,
    pub admin_name: String,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: SecretString,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db()
            .database(&self.database_name)
            .log_statements(tracing::log::LevelFilter::Trace)
    }

    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
    }
}

#[derive(Debug, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "{other} is not supported environment. Try to use `local` or `production`",
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to determine current directory: {e}")))?;
    let conf_dir = base_path.join("configuration");
    let env: Environment = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let settings = config::Config::builder()
        .add_source(config::File::from(conf_dir.join("base")).required(true))
        .add_source(config::File::from(conf_dir.join(env.as_str())).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .prefix_separator("_"),
        )
        // Deployments configure the operator inbox through a bare ADMIN_EMAIL.
        .set_override_option("contact.operator_email", std::env::var("ADMIN_EMAIL").ok())?
        .build()?;

    settings.try_deserialize::<Settings>()
}
