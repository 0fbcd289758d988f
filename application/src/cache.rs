//! Result cache for read-only tools
//!
//! Only tools in [`READ_ONLY_TOOLS`] are ever cached; for any other name
//! `get` returns `None` and `set` does nothing. Replaying a mutating tool
//! from cache would silently skip its side effects.
//!
//! Keys are the SHA-256 of `tool_name ":" canonical_json(args)`, where the
//! canonical form sorts object keys recursively, so argument order never
//! matters and large argument blobs never grow the key.
//!
//! Expiry is lazy (checked on `get`); eviction of the least recently
//! accessed entry happens on `set` when the cache is full.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Tools whose results may be served from cache.
pub const READ_ONLY_TOOLS: &[&str] = &[
    "read_file",
    "list_directory",
    "web_search",
    "strixdb_search",
    "strixdb_get",
    "strixdb_list",
    "cve_search",
    "get_agent_capabilities",
];

pub fn is_cacheable(tool_name: &str) -> bool {
    READ_ONLY_TOOLS.contains(&tool_name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            max_size: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub valid_entries: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

struct CacheEntry {
    value: Value,
    inserted_at: Instant,
    ttl: Duration,
    inserted_seq: u64,
    accessed_seq: Option<u64>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    seq: u64,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Key of the least recently used entry. An entry that was never read
    /// counts as used at insertion, so the oldest insert loses ties.
    fn eviction_candidate(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, e)| e.accessed_seq.unwrap_or(e.inserted_seq))
            .map(|(k, _)| k.clone())
    }
}

pub struct ResultCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn get(&self, tool_name: &str, args: &BTreeMap<String, Value>) -> Option<Value> {
        if !is_cacheable(tool_name) {
            return None;
        }
        let key = cache_key(tool_name, args);
        let now = Instant::now();
        let mut state = self.state.lock();

        let Some(expired) = state.entries.get(&key).map(|e| e.is_expired(now)) else {
            state.misses += 1;
            return None;
        };
        if expired {
            state.entries.remove(&key);
            state.misses += 1;
            debug!(tool = tool_name, "Cache entry expired");
            return None;
        }

        let seq = state.next_seq();
        state.hits += 1;
        let entry = state.entries.get_mut(&key)?;
        entry.accessed_seq = Some(seq);
        debug!(tool = tool_name, "Cache hit");
        Some(entry.value.clone())
    }

    pub fn set(
        &self,
        tool_name: &str,
        args: &BTreeMap<String, Value>,
        value: Value,
        ttl: Option<Duration>,
    ) {
        if !is_cacheable(tool_name) || self.config.max_size == 0 {
            return;
        }
        let key = cache_key(tool_name, args);
        let mut state = self.state.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.config.max_size {
            if let Some(victim) = state.eviction_candidate() {
                state.entries.remove(&victim);
                debug!("Cache full, evicted least recently used entry");
            }
        }

        let seq = state.next_seq();
        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl: ttl.unwrap_or(self.config.default_ttl),
                inserted_seq: seq,
                accessed_seq: None,
            },
        );
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let state = self.state.lock();
        let lookups = state.hits + state.misses;
        CacheStats {
            size: state.entries.len(),
            valid_entries: state.entries.values().filter(|e| !e.is_expired(now)).count(),
            max_size: self.config.max_size,
            hits: state.hits,
            misses: state.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
        }
    }
}

/// SHA-256 hex digest of the tool name and canonical arguments.
pub fn cache_key(tool_name: &str, args: &BTreeMap<String, Value>) -> String {
    let mut canonical = String::new();
    for (i, (k, v)) in args.iter().enumerate() {
        if i > 0 {
            canonical.push(',');
        }
        write_canonical(&Value::String(k.clone()), &mut canonical);
        canonical.push(':');
        write_canonical(v, &mut canonical);
    }

    let mut hasher = Sha256::new();
    hasher.update(tool_name.as_bytes());
    hasher.update(b":{");
    hasher.update(canonical.as_bytes());
    hasher.update(b"}");
    hex::encode(hasher.finalize())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_non_read_only_tools_never_cached() {
        let cache = ResultCache::default();
        let a = args(json!({"command": "id"}));
        cache.set("run_command", &a, json!("uid=0"), None);
        assert_eq!(cache.get("run_command", &a), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_is_order_independent() {
        let cache = ResultCache::default();
        let mut forward = BTreeMap::new();
        forward.insert("a".to_string(), json!(1));
        forward.insert("b".to_string(), json!({"y": 2, "x": 1}));
        cache.set("read_file", &forward, json!("hit"), None);

        let reverse = args(json!({"b": {"x": 1, "y": 2}, "a": 1}));
        assert_eq!(cache.get("read_file", &reverse), Some(json!("hit")));
        assert_eq!(cache_key("read_file", &forward), cache_key("read_file", &reverse));
        assert_eq!(cache_key("read_file", &forward).len(), 64);
    }

    #[test]
    fn test_tool_name_is_part_of_key() {
        let a = args(json!({"q": "x"}));
        assert_ne!(cache_key("web_search", &a), cache_key("cve_search", &a));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_lazy_expiry() {
        let cache = ResultCache::default();
        let a = args(json!({"path": "/etc/hosts"}));
        cache.set("read_file", &a, json!("127.0.0.1"), Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(cache.get("read_file", &a), Some(json!("127.0.0.1")));

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(cache.stats().valid_entries, 0);
        assert_eq!(cache.get("read_file", &a), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = ResultCache::new(CacheConfig {
            max_size: 2,
            ..Default::default()
        });
        let a = args(json!({"path": "a"}));
        let b = args(json!({"path": "b"}));
        let c = args(json!({"path": "c"}));

        cache.set("read_file", &a, json!("A"), None);
        cache.set("read_file", &b, json!("B"), None);
        assert!(cache.get("read_file", &a).is_some());
        cache.set("read_file", &c, json!("C"), None);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("read_file", &a).is_some());
        assert!(cache.get("read_file", &b).is_none());
        assert!(cache.get("read_file", &c).is_some());
    }

    #[test]
    fn test_lru_prefers_least_recently_read() {
        let cache = ResultCache::new(CacheConfig {
            max_size: 2,
            ..Default::default()
        });
        let a = args(json!({"path": "a"}));
        let b = args(json!({"path": "b"}));
        let c = args(json!({"path": "c"}));

        cache.set("read_file", &a, json!("A"), None);
        cache.set("read_file", &b, json!("B"), None);
        cache.get("read_file", &b);
        cache.get("read_file", &a);
        cache.set("read_file", &c, json!("C"), None);

        assert!(cache.get("read_file", &b).is_none());
        assert!(cache.get("read_file", &a).is_some());
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let cache = ResultCache::new(CacheConfig {
            max_size: 1,
            ..Default::default()
        });
        let a = args(json!({"path": "a"}));
        cache.set("read_file", &a, json!("old"), None);
        cache.set("read_file", &a, json!("new"), None);
        assert_eq!(cache.get("read_file", &a), Some(json!("new")));
    }

    #[test]
    fn test_stats_track_hit_rate() {
        let cache = ResultCache::default();
        let a = args(json!({"path": "a"}));
        cache.get("read_file", &a);
        cache.set("read_file", &a, json!(1), None);
        cache.get("read_file", &a);
        cache.get("read_file", &a);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.stats().hits, 0);
    }
}
