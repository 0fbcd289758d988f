//! Connection pool for transport channels
//!
//! Channels are keyed by `(host, port, secure)` and reused while they have
//! been used within `idle_timeout`. The pool never grows past
//! `max_connections`; once full, callers get a temporary channel that is not
//! tracked, so a burst of new endpoints never blocks.
//!
//! Callers borrow through [`ConnectionPool::checkout`]; the returned
//! [`PooledChannel`] decrements the endpoint's active-use counter on drop.

use crate::ports::channel::{ChannelFactory, ChannelTarget};
use crate::ports::transport::TransportError;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: usize,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStats {
    pub pool_size: usize,
    pub max_connections: usize,
    pub active_connections: usize,
    pub connections_by_server: BTreeMap<String, usize>,
}

struct PooledConnection<C> {
    target: ChannelTarget,
    channel: C,
    created_at: Instant,
    last_used_at: Instant,
}

struct PoolState<C> {
    entries: Vec<PooledConnection<C>>,
    active: HashMap<String, usize>,
}

pub struct ConnectionPool<F: ChannelFactory> {
    factory: F,
    config: PoolConfig,
    state: Mutex<PoolState<F::Channel>>,
}

impl<F: ChannelFactory> ConnectionPool<F> {
    pub fn new(factory: F, config: PoolConfig) -> Self {
        Self {
            factory,
            config,
            state: Mutex::new(PoolState {
                entries: Vec::new(),
                active: HashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get a channel for `endpoint`, reusing a fresh pooled one if present.
    ///
    /// Every successful call increments the endpoint's active counter; pair
    /// it with [`release_channel`](Self::release_channel).
    pub fn get_channel(&self, endpoint: &str, secure: bool) -> Result<F::Channel, TransportError> {
        let target = ChannelTarget::parse(endpoint, secure)?;

        if let Some(channel) = self.reuse(&target, endpoint) {
            return Ok(channel);
        }

        let channel = self.factory.connect(&target)?;
        let now = Instant::now();
        let mut state = self.state.lock();
        *state.active.entry(endpoint.to_string()).or_insert(0) += 1;

        if let Some(existing) = state
            .entries
            .iter_mut()
            .find(|e| e.target == target && now.duration_since(e.last_used_at) < self.config.idle_timeout)
        {
            // Raced with another caller creating the same channel.
            existing.last_used_at = now;
            let pooled = existing.channel.clone();
            drop(state);
            self.factory.close(&channel);
            return Ok(pooled);
        }

        if state.entries.len() < self.config.max_connections {
            debug!(target = %target, "Created pooled channel");
            state.entries.push(PooledConnection {
                target,
                channel: channel.clone(),
                created_at: now,
                last_used_at: now,
            });
        } else {
            warn!(
                target = %target,
                max_connections = self.config.max_connections,
                "Connection pool full, using temporary connection"
            );
        }
        Ok(channel)
    }

    fn reuse(&self, target: &ChannelTarget, endpoint: &str) -> Option<F::Channel> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let idle_timeout = self.config.idle_timeout;
        let channel = state
            .entries
            .iter_mut()
            .find(|e| &e.target == target && now.duration_since(e.last_used_at) < idle_timeout)
            .map(|entry| {
                entry.last_used_at = now;
                entry.channel.clone()
            })?;
        *state.active.entry(endpoint.to_string()).or_insert(0) += 1;
        Some(channel)
    }

    /// Decrement the endpoint's active-use counter. Never closes the channel.
    pub fn release_channel(&self, endpoint: &str) {
        let mut state = self.state.lock();
        if let Some(count) = state.active.get_mut(endpoint) {
            *count = count.saturating_sub(1);
        }
    }

    /// Borrow a channel that is released automatically when dropped.
    pub fn checkout(
        self: &Arc<Self>,
        endpoint: &str,
        secure: bool,
    ) -> Result<PooledChannel<F>, TransportError> {
        let channel = self.get_channel(endpoint, secure)?;
        Ok(PooledChannel {
            pool: Arc::clone(self),
            endpoint: endpoint.to_string(),
            channel,
        })
    }

    /// Drop pooled entries unused for longer than `idle_timeout`.
    pub fn cleanup_idle(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let idle_timeout = self.config.idle_timeout;
        let (stale, fresh): (Vec<_>, Vec<_>) = std::mem::take(&mut state.entries)
            .into_iter()
            .partition(|e| now.duration_since(e.last_used_at) >= idle_timeout);
        state.entries = fresh;
        drop(state);

        for entry in &stale {
            debug!(
                target = %entry.target,
                age_secs = now.duration_since(entry.created_at).as_secs(),
                "Evicting idle channel"
            );
            self.factory.close(&entry.channel);
        }
        stale.len()
    }

    /// Close every pooled channel and clear the counters.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        let entries = std::mem::take(&mut state.entries);
        state.active.clear();
        drop(state);

        for entry in &entries {
            self.factory.close(&entry.channel);
        }
        info!(closed = entries.len(), "Connection pool shut down");
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            pool_size: state.entries.len(),
            max_connections: self.config.max_connections,
            active_connections: state.active.values().sum(),
            connections_by_server: state
                .active
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }
}

impl<F: ChannelFactory + 'static> ConnectionPool<F> {
    /// Run [`cleanup_idle`](Self::cleanup_idle) every `interval` until the
    /// returned handle is aborted.
    pub fn spawn_idle_reaper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = pool.cleanup_idle();
                if evicted > 0 {
                    debug!(evicted, "Idle reaper pruned channels");
                }
            }
        })
    }
}

/// A checked-out channel; releases its pool slot on drop.
pub struct PooledChannel<F: ChannelFactory> {
    pool: Arc<ConnectionPool<F>>,
    endpoint: String,
    channel: F::Channel,
}

impl<F: ChannelFactory> PooledChannel<F> {
    pub fn channel(&self) -> &F::Channel {
        &self.channel
    }
}

impl<F: ChannelFactory> std::ops::Deref for PooledChannel<F> {
    type Target = F::Channel;

    fn deref(&self) -> &Self::Target {
        &self.channel
    }
}

impl<F: ChannelFactory> Drop for PooledChannel<F> {
    fn drop(&mut self) {
        self.pool.release_channel(&self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
        closed: AtomicUsize,
    }

    impl ChannelFactory for Arc<CountingFactory> {
        type Channel = (String, usize);

        fn connect(&self, target: &ChannelTarget) -> Result<Self::Channel, TransportError> {
            let id = self.created.fetch_add(1, Ordering::SeqCst);
            Ok((target.uri(), id))
        }

        fn close(&self, _channel: &Self::Channel) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn pool(max: usize, idle_secs: u64) -> (Arc<ConnectionPool<Arc<CountingFactory>>>, Arc<CountingFactory>) {
        let factory = Arc::new(CountingFactory::default());
        let pool = ConnectionPool::new(
            factory.clone(),
            PoolConfig {
                max_connections: max,
                idle_timeout: Duration::from_secs(idle_secs),
            },
        );
        (Arc::new(pool), factory)
    }

    #[tokio::test]
    async fn test_reuses_matching_channel() {
        let (pool, factory) = pool(5, 300);
        let a = pool.get_channel("worker:50051", false).unwrap();
        let b = pool.get_channel("worker:50051", false).unwrap();
        assert_eq!(a, b);
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(pool.stats().active_connections, 2);

        pool.release_channel("worker:50051");
        pool.release_channel("worker:50051");
        pool.release_channel("worker:50051");
        assert_eq!(pool.stats().active_connections, 0);
    }

    #[tokio::test]
    async fn test_secure_mode_is_part_of_the_key() {
        let (pool, factory) = pool(5, 300);
        pool.get_channel("worker:8443", false).unwrap();
        pool.get_channel("worker:8443", true).unwrap();
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
        assert_eq!(pool.stats().pool_size, 2);
    }

    #[tokio::test]
    async fn test_capacity_bound_uses_temporary_channels() {
        let (pool, factory) = pool(3, 300);
        for port in 0..8u16 {
            let endpoint = format!("host-{}:{}", port, 9000 + port);
            assert!(pool.get_channel(&endpoint, false).is_ok());
            assert!(pool.stats().pool_size <= 3);
        }
        assert_eq!(pool.stats().pool_size, 3);
        assert_eq!(factory.created.load(Ordering::SeqCst), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_entries_are_not_reused_and_get_cleaned() {
        let (pool, factory) = pool(5, 10);
        pool.get_channel("worker:1", false).unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(pool.cleanup_idle(), 1);
        assert_eq!(factory.closed.load(Ordering::SeqCst), 1);
        assert_eq!(pool.stats().pool_size, 0);

        pool.get_channel("worker:1", false).unwrap();
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_checkout_guard_releases_on_drop() {
        let (pool, _) = pool(5, 300);
        {
            let guard = pool.checkout("worker:50051", false).unwrap();
            assert_eq!(guard.channel().0, "http://worker:50051");
            assert_eq!(pool.stats().connections_by_server["worker:50051"], 1);
        }
        assert_eq!(pool.stats().connections_by_server["worker:50051"], 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything() {
        let (pool, factory) = pool(5, 300);
        pool.get_channel("a:1", false).unwrap();
        pool.get_channel("b:2", false).unwrap();
        pool.shutdown();
        assert_eq!(factory.closed.load(Ordering::SeqCst), 2);
        let stats = pool.stats();
        assert_eq!(stats.pool_size, 0);
        assert_eq!(stats.active_connections, 0);
    }

    #[test]
    fn test_invalid_endpoint_is_an_error() {
        let (pool, _) = pool(5, 300);
        assert!(pool.get_channel("host:99999", false).is_err());
    }
}
