//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub hub: HubConfig,
    /// Redis history store; `None` selects the in-memory store
    pub redis: Option<RedisConfig>,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Listen address
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Redis history store configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
    /// List key holding the history
    pub history_key: String,
}

/// Coordination core tunables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Idle-read window; refreshed by every pong
    pub pong_wait_ms: u64,
    /// Heartbeat period; must be below `pong_wait_ms`
    pub ping_period_ms: u64,
    /// Deadline for a single frame write
    pub write_wait_ms: u64,
    /// Largest accepted inbound message, in bytes
    pub max_message_size: usize,
    /// Per-session outbound queue capacity
    pub outbound_capacity: usize,
    /// Inactivity threshold before a session is forced offline
    pub liveness_timeout_ms: u64,
    /// History entries replayed to a new session
    pub history_depth: usize,
    /// History entries retained by the store
    pub history_capacity: usize,
    /// Hub request queue capacity
    pub command_buffer: usize,
    /// History writer queue capacity
    pub history_buffer: usize,
}

impl HubConfig {
    #[must_use]
    pub fn pong_wait(&self) -> Duration {
        Duration::from_millis(self.pong_wait_ms)
    }

    #[must_use]
    pub fn ping_period(&self) -> Duration {
        Duration::from_millis(self.ping_period_ms)
    }

    #[must_use]
    pub fn write_wait(&self) -> Duration {
        Duration::from_millis(self.write_wait_ms)
    }

    #[must_use]
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    /// Check the invariants between tunables
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("HUB_PONG_WAIT_MS", self.pong_wait_ms == 0),
            ("HUB_PING_PERIOD_MS", self.ping_period_ms == 0),
            ("HUB_WRITE_WAIT_MS", self.write_wait_ms == 0),
            ("HUB_MAX_MESSAGE_SIZE", self.max_message_size == 0),
            ("HUB_OUTBOUND_CAPACITY", self.outbound_capacity == 0),
            ("HUB_LIVENESS_TIMEOUT_MS", self.liveness_timeout_ms == 0),
            ("HUB_HISTORY_CAPACITY", self.history_capacity == 0),
            ("HUB_COMMAND_BUFFER", self.command_buffer == 0),
            ("HUB_HISTORY_BUFFER", self.history_buffer == 0),
        ];
        if let Some(&(name, _)) = non_zero.iter().find(|(_, zero)| *zero) {
            return Err(ConfigError::InvalidValue(
                name,
                "must be greater than zero".to_string(),
            ));
        }

        if self.ping_period_ms >= self.pong_wait_ms {
            return Err(ConfigError::InvalidValue(
                "HUB_PING_PERIOD_MS",
                format!(
                    "{} must be less than HUB_PONG_WAIT_MS ({})",
                    self.ping_period_ms, self.pong_wait_ms
                ),
            ));
        }

        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        let pong_wait_ms = default_pong_wait_ms();
        Self {
            pong_wait_ms,
            ping_period_ms: default_ping_period_ms(pong_wait_ms),
            write_wait_ms: default_write_wait_ms(),
            max_message_size: default_max_message_size(),
            outbound_capacity: default_outbound_capacity(),
            liveness_timeout_ms: default_liveness_timeout_ms(),
            history_depth: default_history_depth(),
            history_capacity: default_history_capacity(),
            command_buffer: default_command_buffer(),
            history_buffer: default_history_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "broadcast-hub".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_pong_wait_ms() -> u64 {
    60_000
}

fn default_ping_period_ms(pong_wait_ms: u64) -> u64 {
    pong_wait_ms * 9 / 10
}

fn default_write_wait_ms() -> u64 {
    10_000
}

fn default_max_message_size() -> usize {
    512
}

fn default_outbound_capacity() -> usize {
    256
}

fn default_liveness_timeout_ms() -> u64 {
    600_000
}

fn default_history_depth() -> usize {
    5
}

fn default_history_capacity() -> usize {
    1000
}

fn default_command_buffer() -> usize {
    1024
}

fn default_history_buffer() -> usize {
    1024
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_history_key() -> String {
    "hub:history".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value or the
    /// resulting hub tunables are inconsistent
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// See [`AppConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(key)
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .map_err(|e| ConfigError::InvalidValue(key, format!("{s:?}: {e}")))
                })
                .transpose()
        };
        let parse_usize = |key: &'static str| -> Result<Option<usize>, ConfigError> {
            parse(key)?
                .map(|v| {
                    usize::try_from(v).map_err(|e| ConfigError::InvalidValue(key, e.to_string()))
                })
                .transpose()
        };

        let pong_wait_ms = parse("HUB_PONG_WAIT_MS")?.unwrap_or_else(default_pong_wait_ms);
        let hub = HubConfig {
            pong_wait_ms,
            ping_period_ms: parse("HUB_PING_PERIOD_MS")?
                .unwrap_or_else(|| default_ping_period_ms(pong_wait_ms)),
            write_wait_ms: parse("HUB_WRITE_WAIT_MS")?.unwrap_or_else(default_write_wait_ms),
            max_message_size: parse_usize("HUB_MAX_MESSAGE_SIZE")?
                .unwrap_or_else(default_max_message_size),
            outbound_capacity: parse_usize("HUB_OUTBOUND_CAPACITY")?
                .unwrap_or_else(default_outbound_capacity),
            liveness_timeout_ms: parse("HUB_LIVENESS_TIMEOUT_MS")?
                .unwrap_or_else(default_liveness_timeout_ms),
            history_depth: parse_usize("HUB_HISTORY_DEPTH")?.unwrap_or_else(default_history_depth),
            history_capacity: parse_usize("HUB_HISTORY_CAPACITY")?
                .unwrap_or_else(default_history_capacity),
            command_buffer: parse_usize("HUB_COMMAND_BUFFER")?
                .unwrap_or_else(default_command_buffer),
            history_buffer: parse_usize("HUB_HISTORY_BUFFER")?
                .unwrap_or_else(default_history_buffer),
        };
        hub.validate()?;

        let port = match lookup("GATEWAY_PORT") {
            Some(s) => s
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue("GATEWAY_PORT", s))?,
            None => default_port(),
        };

        let redis = match lookup("REDIS_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(RedisConfig {
                url,
                max_connections: parse("REDIS_MAX_CONNECTIONS")?
                    .map(|v| {
                        u32::try_from(v).map_err(|e| {
                            ConfigError::InvalidValue("REDIS_MAX_CONNECTIONS", e.to_string())
                        })
                    })
                    .transpose()?
                    .unwrap_or_else(default_redis_max_connections),
                history_key: lookup("REDIS_HISTORY_KEY").unwrap_or_else(default_history_key),
            }),
            None => None,
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port,
            },
            hub,
            redis,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
