use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_aux::field_attributes::{
    deserialize_number_from_string, deserialize_option_number_from_string,
};
use teloxide::types::AllowedUpdate;
use thiserror::Error;
use url::Url;

/// Environment variables recognized by the bot and the settings key each one fills.
pub const ENV_MAPPING: &[(&str, &str)] = &[
    ("BOT_TOKEN", "bot.token"),
    ("BOT_MODE", "bot.mode"),
    ("BOT_WEBHOOK", "bot.webhook_url"),
    ("BOT_WEBHOOK_SECRET", "bot.webhook_secret"),
    ("BOT_ALLOWED_UPDATES", "bot.allowed_updates"),
    ("BOT_WELCOME_MESSAGE", "bot.welcome_message"),
    ("ADMIN_SECRET_KEY", "signer.private_key"),
    ("THIRDWEB_CLIENT_ID", "signer.client_id"),
    ("FRONTEND_APP_ORIGIN", "link.frontend_origin"),
    ("LOGIN_LINK_TTL_SECS", "link.ttl_secs"),
    ("REMINDER_INTERVAL_SECS", "reminders.interval_secs"),
    ("APP_HOST", "app.host"),
    ("PORT", "app.port"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Unsupported environment type: {0}. Use `local` or `production`")]
    UnknownEnvironment(String),

    #[error("Webhook mode requires BOT_WEBHOOK to be set")]
    MissingWebhookUrl,

    #[error("BOT_WEBHOOK_SECRET must be 1-256 characters of A-Z, a-z, 0-9, `_` and `-`")]
    InvalidWebhookSecret,

    #[error("FRONTEND_APP_ORIGIN must be an absolute http(s) url, got `{0}`")]
    InvalidFrontendOrigin(String),

    #[error("Reminder interval must be greater than zero")]
    ZeroReminderInterval,

    #[error("Invalid signer private key: {0}")]
    InvalidPrivateKey(String),
}

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub bot: BotSettings,
    pub signer: SignerSettings,
    pub link: LinkSettings,
    #[serde(default)]
    pub reminders: ReminderSettings,
    pub app: AppSettings,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    Polling,
    Webhook,
}

#[derive(Deserialize, Clone)]
pub struct BotSettings {
    pub token: SecretString,
    pub mode: BotMode,
    pub webhook_url: Option<Url>,
    pub webhook_secret: Option<SecretString>,
    #[serde(deserialize_with = "deserialize_allowed_updates")]
    pub allowed_updates: Vec<UpdateKind>,
    pub welcome_message: Option<String>,
}

impl BotSettings {
    pub fn allowed_updates(&self) -> Vec<AllowedUpdate> {
        self.allowed_updates.iter().copied().map(Into::into).collect()
    }
}

/// Update types the bot may subscribe to.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Message,
    EditedMessage,
    CallbackQuery,
    InlineQuery,
    MyChatMember,
    ChatMember,
}

impl From<UpdateKind> for AllowedUpdate {
    fn from(kind: UpdateKind) -> Self {
        match kind {
            UpdateKind::Message => AllowedUpdate::Message,
            UpdateKind::EditedMessage => AllowedUpdate::EditedMessage,
            UpdateKind::CallbackQuery => AllowedUpdate::CallbackQuery,
            UpdateKind::InlineQuery => AllowedUpdate::InlineQuery,
            UpdateKind::MyChatMember => AllowedUpdate::MyChatMember,
            UpdateKind::ChatMember => AllowedUpdate::ChatMember,
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct SignerSettings {
    pub private_key: SecretString,
    pub client_id: String,
}

#[derive(Deserialize, Clone)]
pub struct LinkSettings {
    pub frontend_origin: Url,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub ttl_secs: Option<u64>,
}

impl LinkSettings {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Deserialize, Clone, Default)]
pub struct ReminderSettings {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub interval_secs: Option<u64>,
}

impl ReminderSettings {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}

#[derive(Deserialize, Clone)]
pub struct AppSettings {
    pub host: IpAddr,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl AppSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

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
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment(value)),
        }
    }
}

pub fn get_config() -> Result<Settings, ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()?;
    let config_dir: PathBuf = std::env::var("CONFIG_DIR")
        .unwrap_or_else(|_| match environment {
            Environment::Local => "configuration".into(),
            Environment::Production => "/etc/game-launch-bot".into(),
        })
        .into();
    let builder = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base")).required(false))
        .add_source(config::File::from(config_dir.join(environment.as_str())).required(false));
    build_settings(builder, std::env::vars())
}

/// Layers the mapped environment variables over `builder` and validates the result.
pub fn build_settings<I>(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    vars: I,
) -> Result<Settings, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut builder = builder
        .set_default("bot.mode", "polling")?
        .set_default("bot.allowed_updates", "message,my_chat_member")?
        .set_default("app.host", "0.0.0.0")?
        .set_default("app.port", 3000)?;

    for (name, value) in vars {
        if let Some((_, key)) = ENV_MAPPING.iter().find(|(env, _)| *env == name) {
            builder = builder.set_override(*key, value)?;
        }
    }

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.mode == BotMode::Webhook && self.bot.webhook_url.is_none() {
            return Err(ConfigError::MissingWebhookUrl);
        }
        if let Some(secret) = &self.bot.webhook_secret {
            if !is_valid_webhook_secret(secret.expose_secret()) {
                return Err(ConfigError::InvalidWebhookSecret);
            }
        }
        let origin = &self.link.frontend_origin;
        if !matches!(origin.scheme(), "http" | "https") || origin.cannot_be_a_base() {
            return Err(ConfigError::InvalidFrontendOrigin(origin.to_string()));
        }
        if self.reminders.interval_secs == Some(0) {
            return Err(ConfigError::ZeroReminderInterval);
        }
        Ok(())
    }
}

/// Telegram accepts 1-256 characters from `A-Za-z0-9_-` as a webhook secret token.
fn is_valid_webhook_secret(secret: &str) -> bool {
    (1..=256).contains(&secret.len())
        && secret
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn deserialize_allowed_updates<'de, D>(deserializer: D) -> Result<Vec<UpdateKind>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{value::StrDeserializer, IntoDeserializer};

    let raw = String::deserialize(deserializer)?;
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let de: StrDeserializer<'_, serde::de::value::Error> = item.into_deserializer();
            UpdateKind::deserialize(de).map_err(serde::de::Error::custom)
        })
        .collect()
}
