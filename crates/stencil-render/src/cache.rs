//! LRU+TTL caches for render output.
//!
//! Recency is tracked with a monotonically increasing tick per access and
//! a `BTreeMap` from tick to key, so the least recently used entry is
//! always the first key of the map.

use crate::config::{CacheConfig, RenderConfig};
use crate::options::RenderOptions;
use crate::result::RenderResult;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Byte size a value is accounted at.
pub trait CacheWeight {
    fn weight(&self) -> usize;
}

impl CacheWeight for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// Counters of one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// `hits / (hits + misses)`, 0 when nothing was looked up.
    pub hit_rate: f64,
}

struct Entry<V> {
    value: V,
    size: usize,
    inserted_at: Instant,
    tick: u64,
}

/// Bounded cache with least-recently-used eviction and time-to-live
/// expiry.
pub struct LruCache<V> {
    config: CacheConfig,
    entries: HashMap<String, Entry<V>>,
    recency: BTreeMap<u64, String>,
    next_tick: u64,
    size_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    last_sweep: Instant,
}

impl<V: CacheWeight + Clone> LruCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
            size_bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            last_sweep: Instant::now(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.config.ttl()
    }

    /// Look up `key`, promoting it to most recently used.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// [`get`](Self::get) with an explicit clock.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        self.maybe_sweep(now);

        let expired = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => self.is_expired(entry, now),
        };
        if expired {
            self.remove(key);
            self.misses += 1;
            return None;
        }

        let tick = self.tick();
        let entry = self.entries.get_mut(key)?;
        let old_tick = std::mem::replace(&mut entry.tick, tick);
        let value = entry.value.clone();
        if let Some(k) = self.recency.remove(&old_tick) {
            self.recency.insert(tick, k);
        }
        self.hits += 1;
        Some(value)
    }

    /// Whether a live entry exists. Does not touch recency or counters.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !self.is_expired(entry, Instant::now()))
    }

    /// Insert `value`, evicting least recently used entries until both
    /// budgets hold. Returns `false` when the value alone exceeds the byte
    /// budget and was not stored.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> bool {
        self.set_at(key, value, Instant::now())
    }

    /// [`set`](Self::set) with an explicit clock.
    pub fn set_at(&mut self, key: impl Into<String>, value: V, now: Instant) -> bool {
        let key = key.into();
        let size = value.weight();
        self.maybe_sweep(now);
        self.remove(&key);

        if size > self.config.max_size_bytes || self.config.max_entries == 0 {
            log::debug!("Not caching {key}: {size} bytes exceeds the cache budget");
            return false;
        }

        while !self.entries.is_empty()
            && (self.entries.len() >= self.config.max_entries
                || self.size_bytes + size > self.config.max_size_bytes)
        {
            self.evict_lru();
        }

        let tick = self.tick();
        self.recency.insert(tick, key.clone());
        self.size_bytes += size;
        self.entries.insert(
            key,
            Entry {
                value,
                size,
                inserted_at: now,
                tick,
            },
        );
        true
    }

    fn evict_lru(&mut self) {
        let Some((_, key)) = self.recency.pop_first() else {
            return;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.size_bytes = self.size_bytes.saturating_sub(entry.size);
            self.evictions += 1;
            log::trace!("Evicted {key} ({} bytes)", entry.size);
        }
    }

    /// Remove `key`. Returns the value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        self.size_bytes = self.size_bytes.saturating_sub(entry.size);
        Some(entry.value)
    }

    /// Remove every entry whose key matches `predicate`.
    pub fn remove_where(&mut self, predicate: impl Fn(&str) -> bool) -> usize {
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        for key in &keys {
            self.remove(key);
        }
        keys.len()
    }

    fn maybe_sweep(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_sweep) >= self.config.cleanup_interval() {
            self.sweep_expired_at(now);
        }
    }

    /// Drop every expired entry.
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    /// [`sweep_expired`](Self::sweep_expired) with an explicit clock.
    pub fn sweep_expired_at(&mut self, now: Instant) -> usize {
        self.last_sweep = now;
        let ttl: Duration = self.config.ttl();
        let removed =
            self.remove_where_entry(|entry| now.saturating_duration_since(entry.inserted_at) >= ttl);
        if removed > 0 {
            log::debug!("Swept {removed} expired cache entries");
        }
        removed
    }

    fn remove_where_entry(&mut self, predicate: impl Fn(&Entry<V>) -> bool) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            self.remove(key);
        }
        keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.size_bytes = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            entries: self.entries.len(),
            size_bytes: self.size_bytes,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }
}

/// Stats of all three render caches.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderCacheStats {
    pub previews: CacheStats,
    pub thumbnails: CacheStats,
    pub results: CacheStats,
}

/// The renderer's caches: preview and thumbnail data URLs keyed by
/// template id, and full results keyed by render key.
pub struct RenderCache {
    pub previews: LruCache<String>,
    pub thumbnails: LruCache<String>,
    pub results: LruCache<Arc<RenderResult>>,
}

impl RenderCache {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            previews: LruCache::new(config.previews.clone()),
            thumbnails: LruCache::new(config.thumbnails.clone()),
            results: LruCache::new(config.render_results.clone()),
        }
    }

    /// Drop everything cached for `template_id`.
    pub fn invalidate_template(&mut self, template_id: &str) -> usize {
        let prefix = format!("{template_id}_");
        let mut removed = 0;
        removed += usize::from(self.previews.remove(template_id).is_some());
        removed += usize::from(self.thumbnails.remove(template_id).is_some());
        removed += self.results.remove_where(|key| key.starts_with(&prefix));
        log::debug!("Invalidated {removed} cache entries for {template_id}");
        removed
    }

    /// Drop expired entries from all three caches.
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&mut self, now: Instant) -> usize {
        self.previews.sweep_expired_at(now)
            + self.thumbnails.sweep_expired_at(now)
            + self.results.sweep_expired_at(now)
    }

    /// Shortest cleanup interval of the three caches.
    pub fn cleanup_interval(&self) -> Duration {
        self.previews
            .config()
            .cleanup_interval()
            .min(self.thumbnails.config().cleanup_interval())
            .min(self.results.config().cleanup_interval())
    }

    pub fn stats(&self) -> RenderCacheStats {
        RenderCacheStats {
            previews: self.previews.stats(),
            thumbnails: self.thumbnails.stats(),
            results: self.results.stats(),
        }
    }

    pub fn clear(&mut self) {
        self.previews.clear();
        self.thumbnails.clear();
        self.results.clear();
    }
}

/// Cache key of a render:
/// `{template}_{mode}_{width|auto}x{height|auto}_{quality}_{format}`.
pub fn generate_render_key(template_id: &str, options: &RenderOptions) -> String {
    let side = |v: Option<u32>| v.map_or_else(|| "auto".to_string(), |v| v.to_string());
    format!(
        "{}_{}_{}x{}_{:.2}_{}",
        template_id,
        options.mode.as_str(),
        side(options.width),
        side(options.height),
        options.quality,
        options.format.as_str()
    )
}
