//! Service-level value objects reported by the tool server.

pub mod value_objects;

pub use value_objects::{
    HealthReport, MetricsSummary, NetworkStatus, RegistrationAck, WorkerPoolStats,
};
