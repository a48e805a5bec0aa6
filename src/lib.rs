pub mod cli;
pub mod core;
pub mod providers;
pub mod resolver;
pub mod store;

pub use crate::core::config;

use crate::core::config::AppConfig;
use crate::providers::ProviderRegistry;
use crate::resolver::Resolver;
use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Commands that need a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Convert {
        amount: Decimal,
        from: String,
        to: Vec<String>,
    },
    Providers,
    Assets,
}

/// Wires the registry and cache described by `config` into a resolver.
pub fn build_resolver(config: &AppConfig) -> Result<Resolver> {
    let registry = ProviderRegistry::from_config(&config.providers, config.resolver.timeout())?;
    let data_path = config.default_data_path().ok();
    let cache = store::open_cache(&config.cache, data_path.as_deref());

    Ok(Resolver::new(
        registry,
        cache,
        config.resolver.timeout(),
        &config.resolver.bridge_asset,
    )
    .with_inverse_caching(config.cache.cache_inverse))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("xrate starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Convert { amount, from, to } => {
            let resolver = build_resolver(&config)?;
            cli::convert::run(&resolver, amount, &from, &to).await
        }
        AppCommand::Providers => {
            let resolver = build_resolver(&config)?;
            println!("{}", cli::providers::display_providers(resolver.registry()));
            Ok(())
        }
        AppCommand::Assets => {
            println!("{}", cli::providers::display_assets());
            Ok(())
        }
    }
}
