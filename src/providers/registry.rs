use super::{build_source, util::build_client};
use crate::core::asset::AssetClass;
use crate::core::config::ProviderConfig;
use crate::core::provider::RateSource;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A registered rate source. Immutable once the registry is built.
#[derive(Clone)]
pub struct Provider {
    pub name: String,
    pub asset_classes: Vec<AssetClass>,
    /// Lower is tried first.
    pub priority: u32,
    pub authenticated: bool,
    pub source: Arc<dyn RateSource>,
}

impl Provider {
    pub fn new(
        name: &str,
        asset_classes: &[AssetClass],
        priority: u32,
        source: Arc<dyn RateSource>,
    ) -> Self {
        Provider {
            name: name.to_string(),
            asset_classes: asset_classes.to_vec(),
            priority,
            authenticated: false,
            source,
        }
    }

    pub fn supports(&self, class: AssetClass) -> bool {
        self.asset_classes.contains(&class)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("asset_classes", &self.asset_classes)
            .field("priority", &self.priority)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

/// Providers ordered by ascending priority. Equal priorities keep their
/// registration order, so iteration is the same on every call.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    pub fn new(mut providers: Vec<Provider>) -> Self {
        providers.sort_by_key(|p| p.priority);
        ProviderRegistry { providers }
    }

    /// Builds every configured adapter on one shared HTTP client.
    pub fn from_config(configs: &[ProviderConfig], timeout: Duration) -> Result<Self> {
        let client = build_client(timeout)?;
        let providers = configs
            .iter()
            .map(|config| {
                debug!(
                    name = %config.name(),
                    kind = ?config.kind,
                    authenticated = config.api_key.is_some(),
                    "Registering provider"
                );
                Provider {
                    authenticated: config.api_key.is_some(),
                    ..Provider::new(
                        &config.name(),
                        &config.asset_classes(),
                        config.priority,
                        build_source(config, client.clone()),
                    )
                }
            })
            .collect();
        Ok(Self::new(providers))
    }

    pub fn providers_for(&self, class: AssetClass) -> impl Iterator<Item = &Provider> {
        self.providers.iter().filter(move |p| p.supports(class))
    }

    pub fn all(&self) -> &[Provider] {
        &self.providers
    }
}
