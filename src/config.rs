//! Configuration management with validation and defaults
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `FAIRFLIP_*` environment variables, then CLI flags.

use crate::errors::{ConfigurationError, FairFlipResult};
use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairFlipConfig {
    pub api: ApiSettings,
    pub game: GameSettings,
    pub archive: ArchiveSettings,
    pub auth: AuthSettings,
}

/// HTTP listener settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Points granted to an account the first time it is seen
    pub starting_balance: u64,
    /// Largest bet a room accepts
    pub max_bet: u64,
    /// Presentation delay before a flip result is returned
    pub reveal_delay_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_balance: 1000,
            max_bet: 1_000_000,
            reveal_delay_ms: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    pub retention_secs: u64,
    pub eviction_interval_ms: u64,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            retention_secs: 20,
            eviction_interval_ms: 1000,
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Shared HS256 secret used by the sign-in service
    pub jwt_secret: String,
    /// Expected `iss` claim, unchecked when absent
    pub issuer: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl FairFlipConfig {
    /// Local development preset: loopback listener, fixed secret, the
    /// 1.5 second reveal pause the web client animates against.
    pub fn development() -> Self {
        Self {
            api: ApiSettings {
                host: "127.0.0.1".to_string(),
                ..ApiSettings::default()
            },
            game: GameSettings {
                reveal_delay_ms: 1500,
                ..GameSettings::default()
            },
            archive: ArchiveSettings::default(),
            auth: AuthSettings {
                jwt_secret: "fairflip-dev-secret".to_string(),
                issuer: None,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.api.port == 0 {
            return Err(invalid("api.port", 0, "Port cannot be zero"));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(invalid("api.request_timeout_secs", 0, "Timeout cannot be zero"));
        }

        if self.game.max_bet == 0 {
            return Err(invalid("game.max_bet", 0, "Max bet cannot be zero"));
        }

        if self.archive.retention_secs == 0 {
            return Err(invalid("archive.retention_secs", 0, "Retention cannot be zero"));
        }

        if self.archive.eviction_interval_ms < 10 {
            return Err(invalid(
                "archive.eviction_interval_ms",
                self.archive.eviction_interval_ms,
                "Eviction interval must be at least 10ms",
            ));
        }

        // The reveal pause runs inside the request timeout
        if self.reveal_delay() >= self.request_timeout() {
            return Err(invalid(
                "game.reveal_delay_ms",
                self.game.reveal_delay_ms,
                "Reveal delay must be shorter than the request timeout",
            ));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigurationError::MissingRequired("auth.jwt_secret".to_string()));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.game.reveal_delay_ms)
    }

    pub fn archive_retention(&self) -> Duration {
        Duration::from_secs(self.archive.retention_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_millis(self.archive.eviction_interval_ms)
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String, reason: &str) -> Result<T, ConfigurationError> {
    value.parse().map_err(|_| invalid(key, value, reason))
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load from file (if any) and the process environment, then validate
    pub fn load(&self) -> FairFlipResult<FairFlipConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => FairFlipConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> FairFlipResult<FairFlipConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    pub fn save(&self, config: &FairFlipConfig, path: &str) -> FairFlipResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

/// Apply `FAIRFLIP_*` overrides read through `lookup`
pub fn apply_overrides(
    config: &mut FairFlipConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigurationError> {
    if let Some(host) = lookup("FAIRFLIP_HOST") {
        config.api.host = host;
    }
    if let Some(port) = lookup("FAIRFLIP_PORT") {
        config.api.port = parse_var("FAIRFLIP_PORT", port, "Invalid port number")?;
    }
    if let Some(origins) = lookup("FAIRFLIP_CORS_ORIGINS") {
        config.api.cors_origins = origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
    }

    if let Some(balance) = lookup("FAIRFLIP_STARTING_BALANCE") {
        config.game.starting_balance =
            parse_var("FAIRFLIP_STARTING_BALANCE", balance, "Invalid point amount")?;
    }
    if let Some(delay) = lookup("FAIRFLIP_REVEAL_DELAY_MS") {
        config.game.reveal_delay_ms = parse_var("FAIRFLIP_REVEAL_DELAY_MS", delay, "Invalid delay")?;
    }
    if let Some(retention) = lookup("FAIRFLIP_ARCHIVE_RETENTION_SECS") {
        config.archive.retention_secs =
            parse_var("FAIRFLIP_ARCHIVE_RETENTION_SECS", retention, "Invalid retention")?;
    }

    if let Some(secret) = lookup("FAIRFLIP_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(issuer) = lookup("FAIRFLIP_JWT_ISSUER") {
        config.auth.issuer = Some(issuer).filter(|i| !i.is_empty());
    }

    Ok(())
}
