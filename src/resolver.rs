//! Rate resolution with provider failover, cross-class composition and
//! caching.
//!
//! A pair is resolved in three steps: the cache is consulted, then the
//! providers registered for the pair's asset class are tried in priority
//! order until one answers, and finally the quote (and its inverse) is
//! written back. Fiat/crypto pairs that no single provider can quote go
//! through the bridge asset as two independent resolutions.

use crate::core::asset::AssetClass;
use crate::core::cache::RateCache;
use crate::core::error::{ConvertError, FailedAttempt, Hop, InvalidRequest, ProviderError};
use crate::core::quote::{ConversionRequest, ConversionResult, RateQuote, validate_asset};
use crate::providers::ProviderRegistry;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A resolved quote together with the provider attempts that failed before
/// it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub quote: RateQuote,
    pub failures: Vec<FailedAttempt>,
    pub cached: bool,
}

impl Resolution {
    fn from_cache(quote: RateQuote) -> Self {
        Resolution {
            quote,
            failures: Vec::new(),
            cached: true,
        }
    }
}

pub struct Resolver {
    registry: ProviderRegistry,
    cache: Arc<dyn RateCache>,
    timeout: Duration,
    bridge_asset: String,
    cache_inverse: bool,
}

impl Resolver {
    /// `bridge_asset` must be a normalized fiat symbol.
    pub fn new(
        registry: ProviderRegistry,
        cache: Arc<dyn RateCache>,
        timeout: Duration,
        bridge_asset: &str,
    ) -> Self {
        Resolver {
            registry,
            cache,
            timeout,
            bridge_asset: bridge_asset.to_string(),
            cache_inverse: true,
        }
    }

    pub fn with_inverse_caching(mut self, enabled: bool) -> Self {
        self.cache_inverse = enabled;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Converts `request.amount` using the resolved rate.
    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionResult, ConvertError> {
        let resolution = self
            .resolve(&request.source_asset, &request.target_asset)
            .await?;
        let converted_amount = request
            .amount
            .checked_mul(resolution.quote.rate)
            .ok_or(InvalidRequest::AmountOverflow(request.amount))?;
        Ok(ConversionResult {
            request,
            quote: resolution.quote,
            converted_amount,
            failures: resolution.failures,
            cached: resolution.cached,
        })
    }

    #[instrument(name = "Resolve", skip(self))]
    pub async fn resolve(&self, source: &str, target: &str) -> Result<Resolution, ConvertError> {
        let (source, source_class) = validate_asset(source)?;
        let (target, target_class) = validate_asset(target)?;

        if source == target {
            debug!("Identical assets, no lookup needed");
            return Ok(Resolution {
                quote: RateQuote::identity(&source),
                failures: Vec::new(),
                cached: false,
            });
        }

        if let Some(quote) = self.cache.get(&source, &target).await {
            return Ok(Resolution::from_cache(quote));
        }

        let resolution = match self.route(&source, source_class, &target, target_class) {
            Route::Direct(class) => self.fetch_with_failover(class, &source, &target).await?,
            Route::ViaBridge => self.compose(&source, source_class, &target, target_class).await?,
        };

        info!(
            provider = %resolution.quote.provider(),
            rate = %resolution.quote.rate,
            failed_attempts = resolution.failures.len(),
            "Resolved {}/{}",
            source,
            target
        );
        self.store(&resolution.quote).await;
        Ok(resolution)
    }

    fn route(
        &self,
        source: &str,
        source_class: AssetClass,
        target: &str,
        target_class: AssetClass,
    ) -> Route {
        match (source_class, target_class) {
            (AssetClass::Fiat, AssetClass::Fiat) => Route::Direct(AssetClass::Fiat),
            (AssetClass::Crypto, AssetClass::Crypto) => Route::Direct(AssetClass::Crypto),
            // Crypto sources quote against the bridge currency directly
            _ if source == self.bridge_asset || target == self.bridge_asset => {
                Route::Direct(AssetClass::Crypto)
            }
            _ => Route::ViaBridge,
        }
    }

    /// Resolves source->bridge and bridge->target independently and
    /// multiplies the two rates.
    async fn compose(
        &self,
        source: &str,
        source_class: AssetClass,
        target: &str,
        target_class: AssetClass,
    ) -> Result<Resolution, ConvertError> {
        let bridge = self.bridge_asset.as_str();
        debug!("Composing {}/{} via {}", source, target, bridge);

        let first = self
            .resolve_hop(source, bridge, source_class)
            .await
            .map_err(|e| self.composition_error(Hop::First, source, target, e))?;
        let second = self
            .resolve_hop(bridge, target, target_class)
            .await
            .map_err(|e| self.composition_error(Hop::Second, source, target, e))?;

        let quote = RateQuote::compose(&first.quote, &second.quote).map_err(|error| {
            warn!(%error, "Cannot chain {}/{} with {}/{}", source, bridge, bridge, target);
            let rejected = ConvertError::RateRejected {
                from: bridge.to_string(),
                to: target.to_string(),
                attempt: FailedAttempt {
                    provider: second.quote.provider(),
                    error,
                },
            };
            self.composition_error(Hop::Second, source, target, rejected)
        })?;

        let mut failures = first.failures;
        failures.extend(second.failures);
        Ok(Resolution {
            quote,
            failures,
            cached: false,
        })
    }

    /// One leg of a composition, served by the providers of `class` (the
    /// class of the non-bridge side). The leg is cached on its own so later
    /// direct lookups reuse it.
    async fn resolve_hop(
        &self,
        source: &str,
        target: &str,
        class: AssetClass,
    ) -> Result<Resolution, ConvertError> {
        if let Some(quote) = self.cache.get(source, target).await {
            return Ok(Resolution::from_cache(quote));
        }
        let resolution = self.fetch_with_failover(class, source, target).await?;
        self.store(&resolution.quote).await;
        Ok(resolution)
    }

    fn composition_error(&self, hop: Hop, source: &str, target: &str, inner: ConvertError) -> ConvertError {
        ConvertError::Composition {
            hop,
            from: source.to_string(),
            to: target.to_string(),
            via: self.bridge_asset.clone(),
            inner: Box::new(inner),
        }
    }

    /// Walks the providers for `class` in priority order. The first valid
    /// rate wins; every failure before it is recorded.
    async fn fetch_with_failover(
        &self,
        class: AssetClass,
        source: &str,
        target: &str,
    ) -> Result<Resolution, ConvertError> {
        let mut failures = Vec::new();

        for provider in self.registry.providers_for(class) {
            debug!(provider = %provider.name, "Trying provider for {}/{}", source, target);

            let outcome = match tokio::time::timeout(
                self.timeout,
                provider.source.fetch_rate(source, target),
            )
            .await
            {
                Ok(Ok(rate)) if rate > Decimal::ZERO => Ok(rate),
                Ok(Ok(rate)) => Err(ProviderError::InvalidRate(rate)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ProviderError::Timeout),
            };

            match outcome {
                Ok(rate) => {
                    return Ok(Resolution {
                        quote: RateQuote::direct(source, target, rate, &provider.name),
                        failures,
                        cached: false,
                    });
                }
                Err(error) => {
                    warn!(provider = %provider.name, %error, "Provider failed for {}/{}", source, target);
                    failures.push(FailedAttempt {
                        provider: provider.name.clone(),
                        error,
                    });
                }
            }
        }

        Err(ConvertError::AllProvidersExhausted {
            from: source.to_string(),
            to: target.to_string(),
            class,
            attempts: failures,
        })
    }

    async fn store(&self, quote: &RateQuote) {
        self.cache.put(quote.clone()).await;
        if self.cache_inverse {
            match quote.inverse() {
                Some(inverse) => self.cache.put(inverse).await,
                None => debug!("Rate {} cannot be inverted", quote.rate),
            }
        }
    }
}

enum Route {
    Direct(AssetClass),
    ViaBridge,
}
