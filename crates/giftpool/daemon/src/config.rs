//! Configuration for giftpool-daemon

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Gift content location
    #[serde(default)]
    pub content: ContentConfig,

    /// Notification transport
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            enable_cors: true,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// JSON documents in a directory
    Json {
        /// Directory holding gifts.json, people.json and notifications.json
        #[serde(default = "default_state_dir")]
        dir: PathBuf,
    },
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Reconciliation interval in seconds
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,

    /// Upper bound on a single reconciliation pass
    #[serde(default = "default_pass_timeout")]
    pub pass_timeout_secs: u64,
}

impl SchedulerConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs.max(1))
    }

    pub fn pass_timeout(&self) -> Duration {
        Duration::from_secs(self.pass_timeout_secs.max(1))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: default_reconcile_interval(),
            pass_timeout_secs: default_pass_timeout(),
        }
    }
}

/// Where per-gift presentation files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_content_root")]
    pub root: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_content_root(),
        }
    }
}

/// Notification transport
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Messages kept in process memory; useful with the REST API only
    #[default]
    Memory,

    /// Telegram Bot API
    Telegram(TelegramConfig),
}

/// Telegram Bot API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub token: String,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Long-poll timeout for getUpdates
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Sent once in reply to /start before the first offers
    #[serde(default)]
    pub greeting: Option<String>,

    /// Label of the inline claim button
    #[serde(default = "default_claim_label")]
    pub claim_label: String,

    /// Callback answer after a successful claim
    #[serde(default = "default_claimed_notice")]
    pub claimed_notice: String,

    /// Callback answer when the gift ran out
    #[serde(default = "default_unavailable_notice")]
    pub unavailable_notice: String,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout(),
            greeting: None,
            claim_label: default_claim_label(),
            claimed_notice: default_claimed_notice(),
            unavailable_notice: default_unavailable_notice(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_reconcile_interval() -> u64 {
    2
}

fn default_pass_timeout() -> u64 {
    30
}

fn default_content_root() -> PathBuf {
    PathBuf::from("gift_list")
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_claim_label() -> String {
    "I'll bring this".to_string()
}

fn default_claimed_notice() -> String {
    "Thank you! The gift is yours.".to_string()
}

fn default_unavailable_notice() -> String {
    "Sorry, this gift is no longer available.".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from file
    ///
    /// Nested keys are addressed with a double underscore in the environment,
    /// e.g. `GIFTPOOL_SCHEDULER__RECONCILE_INTERVAL_SECS=5`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with GIFTPOOL_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("GIFTPOOL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
