use crate::core::asset::{AssetClass, classify, normalize_symbol};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// An opaque provider secret. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Credential(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ExchangeRateApi,
    CoinGecko,
    CoinCap,
    CryptoCompare,
}

impl ProviderKind {
    pub fn default_name(&self) -> &'static str {
        match self {
            ProviderKind::ExchangeRateApi => "ExchangeRate-API",
            ProviderKind::CoinGecko => "CoinGecko",
            ProviderKind::CoinCap => "CoinCap",
            ProviderKind::CryptoCompare => "CryptoCompare",
        }
    }

    pub fn default_asset_classes(&self) -> Vec<AssetClass> {
        match self {
            ProviderKind::ExchangeRateApi => vec![AssetClass::Fiat],
            ProviderKind::CoinGecko | ProviderKind::CoinCap => vec![AssetClass::Crypto],
            ProviderKind::CryptoCompare => vec![AssetClass::Fiat, AssetClass::Crypto],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    #[serde(default)]
    pub name: Option<String>,
    /// Lower is tried first.
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub asset_classes: Option<Vec<AssetClass>>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<Credential>,
    /// Environment variable holding the credential, read once at load time.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, priority: u32) -> Self {
        ProviderConfig {
            kind,
            name: None,
            priority,
            asset_classes: None,
            base_url: None,
            api_key: None,
            api_key_env: None,
        }
    }

    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.kind.default_name().to_string())
    }

    pub fn asset_classes(&self) -> Vec<AssetClass> {
        self.asset_classes
            .clone()
            .unwrap_or_else(|| self.kind.default_asset_classes())
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(ProviderKind::ExchangeRateApi, 0),
        ProviderConfig {
            asset_classes: Some(vec![AssetClass::Fiat]),
            ..ProviderConfig::new(ProviderKind::CryptoCompare, 1)
        },
        ProviderConfig::new(ProviderKind::CoinGecko, 0),
        ProviderConfig::new(ProviderKind::CoinCap, 1),
        ProviderConfig {
            asset_classes: Some(vec![AssetClass::Crypto]),
            name: Some("CryptoCompare (crypto)".to_string()),
            ..ProviderConfig::new(ProviderKind::CryptoCompare, 2)
        },
    ]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    /// Per provider call.
    pub timeout_ms: u64,
    /// Intermediate asset for fiat<->crypto conversions.
    pub bridge_asset: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            timeout_ms: 5000,
            bridge_asset: "USD".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub persist: bool,
    pub cache_inverse: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: 1800,
            persist: false,
            cache_inverse: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            resolver: ResolverConfig::default(),
            cache: CacheConfig::default(),
            providers: default_providers(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Loads the default config file, or the built-in defaults when none
    /// has been set up yet.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            return Self::load_from_path(&config_path);
        }
        debug!("No config at {}, using defaults", config_path.display());
        let mut config = Self::default();
        config.finalize(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "xrate", "xrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "xrate", "xrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .finalize(|name| std::env::var(name).ok())
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Resolves credentials through `lookup_env` and validates the result.
    pub fn finalize<F>(&mut self, lookup_env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for provider in &mut self.providers {
            if provider.api_key.is_some() {
                continue;
            }
            if let Some(var) = &provider.api_key_env {
                provider.api_key = lookup_env(var)
                    .filter(|value| !value.trim().is_empty())
                    .map(Credential::new);
                if provider.api_key.is_none() {
                    debug!("No credential in ${} for {}", var, provider.name());
                }
            }
        }

        self.resolver.bridge_asset = normalize_symbol(&self.resolver.bridge_asset);
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.resolver.timeout_ms == 0 {
            bail!("resolver.timeout_ms must be greater than zero");
        }
        if self.cache.ttl_secs == 0 {
            bail!("cache.ttl_secs must be greater than zero");
        }
        if classify(&self.resolver.bridge_asset) != Some(AssetClass::Fiat) {
            bail!(
                "resolver.bridge_asset must be a supported fiat currency, got '{}'",
                self.resolver.bridge_asset
            );
        }
        if self.providers.is_empty() {
            bail!("at least one provider must be configured");
        }

        let mut names = HashSet::new();
        for provider in &self.providers {
            let name = provider.name();
            if !names.insert(name.clone()) {
                bail!("duplicate provider name '{}'", name);
            }
            if provider.asset_classes().is_empty() {
                bail!("provider '{}' supports no asset class", name);
            }
        }
        Ok(())
    }
}
