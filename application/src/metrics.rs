//! Execution metrics
//!
//! One running aggregate per tool plus a server-wide window of recent
//! request timestamps. Percentiles come from the last
//! [`RECENT_DURATIONS`] samples of each tool, not the full history, so
//! memory stays bounded.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;
use strix_domain::{ErrorKind, MetricsSummary};
use tokio::time::Instant;

/// Ring buffer size for per-tool latency samples.
pub const RECENT_DURATIONS: usize = 100;
/// Cap on remembered request timestamps.
pub const RECENT_REQUESTS: usize = 1000;
/// Window of the requests-per-minute gauge.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default)]
struct ToolMetricsRecord {
    count: u64,
    success_count: u64,
    error_count: u64,
    total_duration: Duration,
    min: Option<Duration>,
    max: Duration,
    recent_durations: VecDeque<Duration>,
    errors_by_kind: BTreeMap<ErrorKind, u64>,
}

impl ToolMetricsRecord {
    fn record(&mut self, duration: Duration, success: bool, error_kind: Option<ErrorKind>) {
        self.count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
            if let Some(kind) = error_kind {
                *self.errors_by_kind.entry(kind).or_insert(0) += 1;
            }
        }
        self.total_duration += duration;
        self.min = Some(self.min.map_or(duration, |m| m.min(duration)));
        self.max = self.max.max(duration);
        if self.recent_durations.len() == RECENT_DURATIONS {
            self.recent_durations.pop_front();
        }
        self.recent_durations.push_back(duration);
    }

    fn stats(&self, name: &str) -> ToolStats {
        let mut sorted: Vec<Duration> = self.recent_durations.iter().copied().collect();
        sorted.sort();
        let avg = if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos((self.total_duration.as_nanos() / self.count as u128) as u64)
        };

        ToolStats {
            tool_name: name.to_string(),
            execution_count: self.count,
            success_count: self.success_count,
            error_count: self.error_count,
            success_rate: ratio(self.success_count, self.count),
            avg_duration_ms: millis(avg),
            min_duration_ms: millis(self.min.unwrap_or_default()),
            max_duration_ms: millis(self.max),
            p50_duration_ms: millis(percentile(&sorted, 0.50)),
            p95_duration_ms: millis(percentile(&sorted, 0.95)),
            p99_duration_ms: millis(percentile(&sorted, 0.99)),
            errors_by_kind: self
                .errors_by_kind
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolStats {
    pub tool_name: String,
    pub execution_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub success_rate: f64,
    pub avg_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub p50_duration_ms: f64,
    pub p95_duration_ms: f64,
    pub p99_duration_ms: f64,
    pub errors_by_kind: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerStats {
    pub uptime_seconds: f64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub error_rate: f64,
    pub request_rate_per_minute: f64,
    pub tool_count: usize,
    pub tools: BTreeMap<String, ToolStats>,
}

struct MetricsState {
    started_at: Instant,
    tools: HashMap<String, ToolMetricsRecord>,
    recent_requests: VecDeque<Instant>,
    total_requests: u64,
    total_errors: u64,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
            tools: HashMap::new(),
            recent_requests: VecDeque::with_capacity(RECENT_REQUESTS),
            total_requests: 0,
            total_errors: 0,
        }
    }

    fn request_rate(&self, now: Instant) -> f64 {
        let in_window = self
            .recent_requests
            .iter()
            .filter(|at| now.duration_since(**at) < RATE_WINDOW)
            .count();
        in_window as f64 * 60.0 / RATE_WINDOW.as_secs_f64()
    }
}

pub struct MetricsCollector {
    state: Mutex<MetricsState>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MetricsState::new()),
        }
    }

    pub fn record(
        &self,
        tool_name: &str,
        duration: Duration,
        success: bool,
        error_kind: Option<ErrorKind>,
    ) {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.total_requests += 1;
        if !success {
            state.total_errors += 1;
        }
        if state.recent_requests.len() == RECENT_REQUESTS {
            state.recent_requests.pop_front();
        }
        state.recent_requests.push_back(now);
        state
            .tools
            .entry(tool_name.to_string())
            .or_default()
            .record(duration, success, error_kind);
    }

    pub fn tool_stats(&self, tool_name: &str) -> Option<ToolStats> {
        let state = self.state.lock();
        state.tools.get(tool_name).map(|r| r.stats(tool_name))
    }

    pub fn server_stats(&self) -> ServerStats {
        let now = Instant::now();
        let state = self.state.lock();
        ServerStats {
            uptime_seconds: now.duration_since(state.started_at).as_secs_f64(),
            total_requests: state.total_requests,
            total_errors: state.total_errors,
            error_rate: ratio(state.total_errors, state.total_requests),
            request_rate_per_minute: state.request_rate(now),
            tool_count: state.tools.len(),
            tools: state
                .tools
                .iter()
                .map(|(name, r)| (name.clone(), r.stats(name)))
                .collect(),
        }
    }

    /// Compact view used by health reports.
    pub fn summary(&self) -> MetricsSummary {
        let now = Instant::now();
        let state = self.state.lock();
        MetricsSummary {
            uptime_seconds: now.duration_since(state.started_at).as_secs_f64(),
            total_requests: state.total_requests,
            error_rate: ratio(state.total_errors, state.total_requests),
            request_rate_per_minute: state.request_rate(now),
        }
    }

    /// Clear all counters and restart the uptime clock.
    pub fn reset(&self) {
        *self.state.lock() = MetricsState::new();
    }
}

/// Element at index `floor(len * q)`, clamped to the last sample.
fn percentile(sorted: &[Duration], q: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64 * q) as usize).min(sorted.len() - 1);
    sorted[idx]
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}
