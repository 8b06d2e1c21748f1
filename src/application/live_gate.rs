// Live reading gate - TTL-cached fetch with provider fallback
use crate::application::providers::AqiProvider;
use crate::domain::reading::LiveSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

struct CacheEntry {
    snapshot: LiveSnapshot,
    expires_at: Instant,
}

/// Caches live lookups per rounded coordinate pair so a burst of requests
/// for the same spot issues at most one upstream call per cache window.
///
/// The upstream call happens outside the lock, so concurrent misses for the
/// same key may each go upstream; the last writer's snapshot stays cached.
/// That relaxed guarantee is deliberate: holding the lock across a network
/// call would serialize every unrelated lookup.
pub struct LiveReadingGate {
    primary: Arc<dyn AqiProvider>,
    secondary: Arc<dyn AqiProvider>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl LiveReadingGate {
    pub fn new(
        primary: Arc<dyn AqiProvider>,
        secondary: Arc<dyn AqiProvider>,
        ttl: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            primary,
            secondary,
            cache: RwLock::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    fn cache_key(lat: f64, lon: f64) -> String {
        format!("{:.4},{:.4}", lat, lon)
    }

    /// A live snapshot for the location, from cache when fresh, otherwise
    /// from the primary provider with the secondary as fallback. `None`
    /// when every source is exhausted.
    pub async fn get(&self, lat: f64, lon: f64) -> Option<LiveSnapshot> {
        let key = Self::cache_key(lat, lon);

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if entry.expires_at > Instant::now() {
                    debug!("live AQI cache hit for {}", key);
                    return Some(entry.snapshot.clone());
                }
            }
        }

        debug!("live AQI cache miss for {}", key);
        let snapshot = match self.primary.fetch(lat, lon).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("primary AQI provider failed for {}: {}", key, e);
                match self.secondary.fetch(lat, lon).await {
                    Ok(snapshot) => snapshot,
                    Err(e2) => {
                        error!("all AQI providers failed for {}: {}", key, e2);
                        return None;
                    }
                }
            }
        };

        let mut cache = self.cache.write().await;
        if cache.len() >= self.capacity && !cache.contains_key(&key) {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                cache.remove(&oldest);
            }
        }
        cache.insert(
            key,
            CacheEntry {
                snapshot: snapshot.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Some(snapshot)
    }
}
