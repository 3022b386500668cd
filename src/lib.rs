pub mod analytics;
pub mod error;
pub mod ingest;
pub mod manager;
pub mod metrics;
pub mod packet;
pub mod priority;
pub mod scheduler;
pub mod window;

// Re-export for easier testing
pub use analytics::{AnalyticsConfig, Comparison, ComparativeAnalyticsEngine};
pub use error::{QosError, Result};
pub use ingest::{IngestReport, IngestSender, PacketIngest};
pub use manager::{QosConfig, QosManager, QosMode, QosSnapshot, StreamInfo};
pub use metrics::{MetricsCollector, StreamMetrics};
pub use packet::PacketRecord;
pub use priority::{TrafficLoad, TrafficType, UserDensity};
pub use scheduler::StrategyMode;
