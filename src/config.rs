use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::account::AccountId;
use crate::client::{Cluster, Commitment};
use crate::error::ConfigError;
use crate::view::render::parse_hex_color;
use crate::view::{SupersedePolicy, Theme, ThemeMode, ViewOptions};

pub const DEFAULT_CONFIG_PATH: &str = "sol_connector.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConnectorConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RpcConfig {
    /// `devnet`, `testnet`, `mainnet-beta` or an http(s) URL.
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default)]
    pub commitment: Commitment,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WalletConfig {
    #[serde(default)]
    pub auto_connect: bool,
    #[serde(default)]
    pub last_account: Option<AccountId>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_accent")]
    pub accent: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_color")]
    pub color: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ViewConfig {
    #[serde(default)]
    pub supersede: SupersedePolicy,
    /// Unset means a lookup may stay pending forever.
    #[serde(default)]
    pub lookup_timeout_secs: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cluster() -> String {
    "devnet".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_accent() -> String {
    "#4f46e5".to_string()
}

fn default_title() -> String {
    "Solana Wallet Connect".to_string()
}

fn default_color() -> bool {
    true
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            rpc: RpcConfig::default(),
            wallet: WalletConfig::default(),
            display: DisplayConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
            commitment: Commitment::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: ThemeMode::default(),
            accent: default_accent(),
            title: default_title(),
            color: default_color(),
        }
    }
}

impl ConnectorConfig {
    /// Strict load: missing or malformed files are errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// `Ok(None)` when the file does not exist.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Load `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(Some(config)) => {
                info!("Config loaded from {}", path.display());
                config
            }
            Ok(None) => {
                info!("Config file not found at '{}'. Using defaults.", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Error loading config {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let s = toml::to_string_pretty(self)?;
        std::fs::write(path, s)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cluster()?;
        self.theme()?;
        if self.rpc.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rpc.request_timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn cluster(&self) -> Result<Cluster, ConfigError> {
        self.rpc.cluster.parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.request_timeout_secs)
    }

    pub fn theme(&self) -> Result<Theme, ConfigError> {
        let accent = parse_hex_color(&self.display.accent).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "display.accent",
                value: self.display.accent.clone(),
            }
        })?;
        Ok(Theme {
            mode: self.display.theme,
            accent,
            title: self.display.title.clone(),
            color: self.display.color,
        })
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            supersede: self.view.supersede,
            lookup_timeout: self.view.lookup_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Account to connect on start, when auto-connect is enabled.
    pub fn auto_connect_account(&self) -> Option<AccountId> {
        if self.wallet.auto_connect {
            self.wallet.last_account
        } else {
            None
        }
    }
}
