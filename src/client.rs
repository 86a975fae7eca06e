//! Roast API client
//!
//! Resolves the manifest, draws a random shard through the shard cache,
//! filters it and picks one roast.

use rand::Rng;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::cache::ShardCache;
use crate::config::ClientConfig;
use crate::data::{Manifest, RandomRoast, Roast, RoastOptions, Shard};
use crate::error::{RaasError, RaasResult};
use crate::transport::{HttpTransport, Transport};

/// Result of applying [`RoastOptions`] filters to a shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome<'a> {
    /// Candidates to pick from
    pub roasts: Vec<&'a Roast>,
    /// True when the filters matched nothing and `roasts` is the unfiltered list
    pub fell_back: bool,
}

/// Keeps roasts matching the intensity and max-length filters
///
/// Filters compose. When they leave nothing, the full list is returned with
/// `fell_back` set instead of an empty result.
pub fn filter_roasts<'a>(list: &'a [Roast], options: &RoastOptions) -> FilterOutcome<'a> {
    let filtered: Vec<&Roast> = list
        .iter()
        .filter(|r| options.intensity.map_or(true, |i| r.intensity == i))
        .filter(|r| options.max_length.map_or(true, |max| r.length <= max))
        .collect();

    if filtered.is_empty() && !list.is_empty() {
        return FilterOutcome {
            roasts: list.iter().collect(),
            fell_back: true,
        };
    }

    FilterOutcome {
        roasts: filtered,
        fell_back: false,
    }
}

/// Uniform index in `[0, len)`, or `None` for an empty range
pub fn pick_random_index(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rand::thread_rng().gen_range(0..len))
}

/// Client for the static roast API
///
/// Holds the manifest for its whole lifetime and shards for the cache TTL.
/// No lock is held across a request, so concurrent misses on the same key
/// each fetch and the last write wins.
pub struct RoastClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cache: ShardCache,
    manifest: RwLock<Option<Arc<Manifest>>>,
}

impl RoastClient {
    /// Creates a client with an HTTP transport and an auto-detected cache backend
    pub fn new(config: ClientConfig) -> RaasResult<Self> {
        let transport = HttpTransport::new(config.request_timeout)?;
        let cache = ShardCache::detect(&config.base_url, config.cache_ttl);
        Ok(Self::with_parts(config, Arc::new(transport), cache))
    }

    /// Creates a client from explicit parts
    pub fn with_parts(config: ClientConfig, transport: Arc<dyn Transport>, cache: ShardCache) -> Self {
        Self {
            config,
            transport,
            cache,
            manifest: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &ShardCache {
        &self.cache
    }

    /// Returns the manifest, fetching it on first use
    pub async fn get_manifest(&self) -> RaasResult<Arc<Manifest>> {
        if let Some(manifest) = self.cached_manifest() {
            return Ok(manifest);
        }

        let url = self.config.manifest_url();
        let body = self.transport.get(&url).await?;
        let manifest: Arc<Manifest> =
            Arc::new(serde_json::from_str(&body).map_err(|e| RaasError::malformed(&url, e))?);
        debug!(languages = manifest.languages.len(), "manifest loaded");

        *self.manifest.write().unwrap_or_else(|e| e.into_inner()) = Some(manifest.clone());
        Ok(manifest)
    }

    /// Returns one shard, from cache when fresh
    ///
    /// On a miss the shard is fetched and written to the cache before this
    /// returns. A failed cache write is logged, not returned.
    pub async fn get_shard(&self, lang: &str, shard: u32) -> RaasResult<Shard> {
        if let Some(cached) = self.cache.read(lang, shard) {
            debug!(lang, shard, "shard cache hit");
            return Ok(cached);
        }

        debug!(lang, shard, "shard cache miss");
        let url = self.config.shard_url(lang, shard);
        let body = self.transport.get(&url).await?;
        let data: Shard = serde_json::from_str(&body).map_err(|e| RaasError::malformed(&url, e))?;

        if let Err(e) = self.cache.write(lang, shard, &data) {
            warn!(lang, shard, error = %e, "failed to cache shard");
        }
        Ok(data)
    }

    /// Returns a random roast matching `options` where possible
    ///
    /// # Errors
    /// * `UnsupportedLanguage` if the language is not in the manifest
    /// * `EmptyShard` if the language has no shards or the drawn shard has no roasts
    /// * `Network` from fetching or decoding the manifest or shard
    pub async fn get_random_roast(&self, options: &RoastOptions) -> RaasResult<RandomRoast> {
        let lang = options
            .lang
            .clone()
            .unwrap_or_else(|| self.config.default_lang.clone());

        let shard_count = self.shard_count(&lang).await?;
        let shard_no = pick_random_index(shard_count as usize)
            .map(|i| i as u32 + 1)
            .ok_or_else(|| RaasError::EmptyShard {
                language: lang.clone(),
                shard: 0,
            })?;

        let shard = self.get_shard(&lang, shard_no).await?;
        let outcome = filter_roasts(&shard.roasts, options);
        if outcome.fell_back {
            debug!(lang = %lang, shard = shard_no, "no roast matched filters, using unfiltered shard");
        }

        let idx = pick_random_index(outcome.roasts.len()).ok_or_else(|| RaasError::EmptyShard {
            language: lang.clone(),
            shard: shard_no,
        })?;

        // The shard's own header wins; the request key fills in when it is absent
        Ok(RandomRoast::from_roast(
            shard.language.as_deref().unwrap_or(&lang),
            shard.shard.unwrap_or(shard_no),
            outcome.roasts[idx],
            outcome.fell_back,
        ))
    }

    /// Returns every roast of a language across all of its shards
    pub async fn get_all_roasts(&self, lang: &str) -> RaasResult<Vec<Roast>> {
        let shard_count = self.shard_count(lang).await?;

        let mut roasts = Vec::new();
        for shard in 1..=shard_count {
            roasts.extend(self.get_shard(lang, shard).await?.roasts);
        }
        Ok(roasts)
    }

    /// Forgets the manifest and every cached shard
    pub fn clear_cache(&self) -> RaasResult<()> {
        *self.manifest.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.cache.clear()
    }

    fn cached_manifest(&self) -> Option<Arc<Manifest>> {
        self.manifest.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn shard_count(&self, lang: &str) -> RaasResult<u32> {
        let manifest = self.get_manifest().await?;
        manifest
            .language(lang)
            .map(|info| info.shards)
            .ok_or_else(|| RaasError::UnsupportedLanguage(lang.to_string()))
    }
}
