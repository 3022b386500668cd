//! QoS manager orchestration.
//!
//! The manager owns every scheduling strategy, the per-stream contexts, the metrics
//! collector and the analytics engine. All of that state sits behind one mutex so each
//! `process()` call is a single critical section: the round-robin rotation advances once
//! per packet in a global order, and value-table updates never interleave.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace, warn};

use crate::analytics::{AnalyticsConfig, AnalyticsSnapshot, ComparativeAnalyticsEngine, Comparison};
use crate::error::{QosError, Result};
use crate::metrics::{MetricsCollector, StreamMetrics, DEFAULT_METRICS_WINDOW};
use crate::packet::PacketRecord;
use crate::priority::{TrafficType, UserDensity};
use crate::scheduler::{
    AdaptiveLearningScheduler, ChannelQualityScheduler, LearningConfig, LearningDecision,
    RoundRobinConfig, RoundRobinScheduler, StrategyMode, StrategyReport, StrategyStats, ValueTable,
};
use crate::window::RollingWindow;

/// Strategy selection of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QosMode {
    /// Adaptive learning scheduler only.
    #[default]
    #[serde(rename = "RL")]
    Rl,
    /// Round robin only.
    #[serde(rename = "RR")]
    Rr,
    /// All three strategies on every packet.
    #[serde(rename = "COMPARE")]
    Compare,
}

impl QosMode {
    pub const fn name(self) -> &'static str {
        match self {
            QosMode::Rl => "RL",
            QosMode::Rr => "RR",
            QosMode::Compare => "COMPARE",
        }
    }
}

impl fmt::Display for QosMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QosMode {
    type Err = QosError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "rl" | "adaptive" | "learning" => Ok(QosMode::Rl),
            "rr" | "round-robin" | "round_robin" => Ok(QosMode::Rr),
            "compare" | "all" => Ok(QosMode::Compare),
            other => Err(QosError::InvalidConfig(format!("unknown mode `{other}`"))),
        }
    }
}

/// Top-level configuration used when building a [`QosManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QosConfig {
    pub learning: LearningConfig,
    pub round_robin: RoundRobinConfig,
    /// Samples per metric window in the metrics collector.
    pub metrics_window: usize,
    /// Raw packets remembered per stream.
    pub stream_queue_capacity: usize,
    pub analytics: AnalyticsConfig,
    /// Initial strategy selection.
    pub mode: QosMode,
}

impl Default for QosConfig {
    fn default() -> Self {
        Self {
            learning: LearningConfig::default(),
            round_robin: RoundRobinConfig::default(),
            metrics_window: DEFAULT_METRICS_WINDOW,
            stream_queue_capacity: 100,
            analytics: AnalyticsConfig::default(),
            mode: QosMode::default(),
        }
    }
}

impl QosConfig {
    /// Decode a JSON configuration document; missing sections keep their defaults.
    pub fn from_json(document: &str) -> Result<QosConfig> {
        let config: QosConfig = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(QosError::InvalidConfig(format!("{name} must be within [0, 1], got {value}")))
            }
        };
        unit("learning.learning_rate", self.learning.learning_rate)?;
        unit("learning.gamma", self.learning.gamma)?;
        unit("learning.epsilon", self.learning.epsilon)?;
        unit("learning.epsilon_decay", self.learning.epsilon_decay)?;
        unit("learning.epsilon_min", self.learning.epsilon_min)?;
        if self.learning.epsilon_min > self.learning.epsilon {
            return Err(QosError::InvalidConfig(
                "learning.epsilon_min must not exceed learning.epsilon".to_string(),
            ));
        }

        let positive = [
            ("learning.n_states", self.learning.n_states),
            ("round_robin.time_slice", self.round_robin.time_slice),
            ("metrics_window", self.metrics_window),
            ("stream_queue_capacity", self.stream_queue_capacity),
            ("analytics.window_size", self.analytics.window_size),
            ("analytics.history_capacity", self.analytics.history_capacity),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(QosError::InvalidConfig(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}

/// Per-stream admission state.
#[derive(Debug, Clone)]
struct StreamContext {
    traffic_type: TrafficType,
    user_density: UserDensity,
    priority: u8,
    /// Most recent raw packets submitted for the stream.
    queue: RollingWindow<PacketRecord>,
    last_decision: Option<LearningDecision>,
}

/// Read-only view of a registered stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub stream_id: String,
    pub traffic_type: TrafficType,
    pub user_density: UserDensity,
    pub priority: u8,
    pub queue_length: usize,
    pub last_decision: Option<LearningDecision>,
}

/// Structured report handed to the reporting layer.
#[derive(Debug, Clone, Serialize)]
pub struct QosSnapshot {
    /// Seconds since the Unix epoch.
    pub generated_at: f64,
    pub mode: QosMode,
    pub epsilon: f64,
    #[serde(flatten)]
    pub analytics: AnalyticsSnapshot,
    pub strategies: BTreeMap<StrategyMode, StrategyReport>,
    pub live_metrics: BTreeMap<String, StreamMetrics>,
}

struct ManagerState {
    mode: QosMode,
    stream_queue_capacity: usize,
    streams: HashMap<String, StreamContext>,
    learner: AdaptiveLearningScheduler,
    rotation: RoundRobinScheduler,
    cqi: ChannelQualityScheduler,
    strategy_stats: [StrategyStats; 3],
    metrics: MetricsCollector,
    analytics: ComparativeAnalyticsEngine,
}

impl ManagerState {
    /// Book-keeping shared by every strategy once it has shaped a packet.
    fn record(&mut self, mode: StrategyMode, stream_id: &str, density: UserDensity, shaped: &PacketRecord) {
        self.strategy_stats[mode.index()].record(shaped, density);
        self.analytics.record(mode, stream_id, shaped);
    }

    fn run_adaptive(
        &mut self,
        stream_id: &str,
        packet: &PacketRecord,
        queue_length: usize,
        priority: u8,
        density: UserDensity,
    ) -> PacketRecord {
        // penalty reflects service before this packet is counted
        let penalty = self.strategy_stats[StrategyMode::Adaptive.index()].fairness_penalty();
        let (shaped, decision) = self.learner.schedule(packet, queue_length, priority, penalty);
        trace!(
            stream_id,
            state = decision.state,
            tier = %decision.tier,
            explored = decision.explored,
            reward = decision.reward,
            "adaptive decision"
        );
        if let Some(stream) = self.streams.get_mut(stream_id) {
            stream.last_decision = Some(decision);
        }
        self.record(StrategyMode::Adaptive, stream_id, density, &shaped);
        shaped
    }

    fn run_round_robin(
        &mut self,
        stream_id: &str,
        packet: &PacketRecord,
        priority: u8,
        density: UserDensity,
    ) -> PacketRecord {
        let (shaped, served) = self.rotation.schedule(stream_id, packet, priority);
        trace!(stream_id, served, "round-robin decision");
        self.record(StrategyMode::RoundRobin, stream_id, density, &shaped);
        shaped
    }
}

/// Orchestrator exposing stream lifecycle, mode switching and per-packet processing.
pub struct QosManager {
    state: Mutex<ManagerState>,
}

impl QosManager {
    /// Build a manager from a validated configuration.
    pub fn new(config: QosConfig) -> Result<Self> {
        config.validate()?;
        let state = ManagerState {
            mode: config.mode,
            stream_queue_capacity: config.stream_queue_capacity,
            streams: HashMap::new(),
            learner: AdaptiveLearningScheduler::new(&config.learning),
            rotation: RoundRobinScheduler::new(&config.round_robin),
            cqi: ChannelQualityScheduler::new(),
            strategy_stats: std::array::from_fn(|_| StrategyStats::new()),
            metrics: MetricsCollector::new(config.metrics_window),
            analytics: ComparativeAnalyticsEngine::new(config.analytics),
        };
        debug!(mode = %config.mode, "QoS manager initialised");
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Register a stream; re-registering resets its priority, queue and metrics.
    pub fn register_stream(&self, stream_id: &str, traffic_type: TrafficType, user_density: UserDensity) {
        let mut state = self.state.lock();
        let context = StreamContext {
            traffic_type,
            user_density,
            priority: traffic_type.priority(),
            queue: RollingWindow::new(state.stream_queue_capacity),
            last_decision: None,
        };
        let replaced = state.streams.insert(stream_id.to_string(), context).is_some();
        state.rotation.add_stream(stream_id);
        state.metrics.initialize_stream(stream_id);
        debug!(
            stream_id,
            %traffic_type,
            %user_density,
            priority = traffic_type.priority(),
            replaced,
            "stream registered"
        );
    }

    /// Remove a stream, its rotation slot and its metrics. Unknown ids are a no-op.
    pub fn remove_stream(&self, stream_id: &str) -> bool {
        let mut state = self.state.lock();
        if state.streams.remove(stream_id).is_none() {
            return false;
        }
        state.rotation.remove_stream(stream_id);
        state.metrics.clear_metrics(stream_id);
        debug!(stream_id, "stream removed");
        true
    }

    /// Run the active strategy on a packet.
    ///
    /// Returns the shaped packet and the stream's updated metrics. A packet for an
    /// unregistered stream comes back unmodified with no metrics; a malformed packet is
    /// rejected before any state is touched.
    pub fn process(
        &self,
        stream_id: &str,
        packet: &PacketRecord,
    ) -> Result<(PacketRecord, Option<StreamMetrics>)> {
        if let Err(err) = packet.validate() {
            warn!(stream_id, error = %err, "rejected packet");
            return Err(err);
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        // fallible strategy work happens before any stream state is touched
        let by_channel = match state.mode {
            QosMode::Compare => Some(state.cqi.schedule(packet)?),
            QosMode::Rl | QosMode::Rr => None,
        };
        let Some(stream) = state.streams.get_mut(stream_id) else {
            trace!(stream_id, "packet for unknown stream passed through");
            return Ok((packet.clone(), None));
        };
        stream.queue.push(packet.clone());
        let queue_length = stream.queue.len();
        let priority = stream.priority;
        let density = stream.user_density;

        let shaped = match state.mode {
            QosMode::Rl => state.run_adaptive(stream_id, packet, queue_length, priority, density),
            QosMode::Rr => state.run_round_robin(stream_id, packet, priority, density),
            QosMode::Compare => {
                let adaptive = state.run_adaptive(stream_id, packet, queue_length, priority, density);
                state.run_round_robin(stream_id, packet, priority, density);
                if let Some(by_channel) = &by_channel {
                    state.record(StrategyMode::ChannelQuality, stream_id, density, by_channel);
                }
                adaptive
            }
        };

        state.metrics.update_metrics(stream_id, &shaped);
        let metrics = state.metrics.get_stream_metrics(stream_id);
        Ok((shaped, metrics))
    }

    /// Toggle between the learning scheduler and round robin, returning the new mode.
    pub fn switch_mode(&self) -> &'static str {
        let mut state = self.state.lock();
        state.mode = match state.mode {
            QosMode::Rl => QosMode::Rr,
            QosMode::Rr | QosMode::Compare => QosMode::Rl,
        };
        debug!(mode = %state.mode, "QoS mode switched");
        state.mode.name()
    }

    pub fn set_mode(&self, mode: QosMode) {
        let mut state = self.state.lock();
        state.mode = mode;
        debug!(%mode, "QoS mode set");
    }

    pub fn mode(&self) -> QosMode {
        self.state.lock().mode
    }

    pub fn get_metrics(&self, stream_id: &str) -> Option<StreamMetrics> {
        self.state.lock().metrics.get_stream_metrics(stream_id)
    }

    pub fn get_comparison(&self, stream_id: Option<&str>) -> Comparison {
        self.state.lock().analytics.get_comparison(stream_id)
    }

    pub fn stream_info(&self, stream_id: &str) -> Option<StreamInfo> {
        let state = self.state.lock();
        state.streams.get(stream_id).map(|stream| StreamInfo {
            stream_id: stream_id.to_string(),
            traffic_type: stream.traffic_type,
            user_density: stream.user_density,
            priority: stream.priority,
            queue_length: stream.queue.len(),
            last_decision: stream.last_decision,
        })
    }

    pub fn stream_count(&self) -> usize {
        self.state.lock().streams.len()
    }

    /// Whether the stream currently holds a place in the round-robin rotation.
    pub fn in_rotation(&self, stream_id: &str) -> bool {
        self.state.lock().rotation.contains(stream_id)
    }

    pub fn epsilon(&self) -> f64 {
        self.state.lock().learner.epsilon()
    }

    pub fn value_table(&self) -> ValueTable {
        self.state.lock().learner.value_table().clone()
    }

    pub fn strategy_statistics(&self) -> BTreeMap<StrategyMode, StrategyReport> {
        let state = self.state.lock();
        StrategyMode::ALL
            .into_iter()
            .map(|mode| (mode, state.strategy_stats[mode.index()].report()))
            .collect()
    }

    /// Full report: comparisons, recent history, strategy aggregates and live metrics.
    pub fn export_snapshot(&self) -> QosSnapshot {
        let generated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let state = self.state.lock();
        let live_metrics = state
            .streams
            .keys()
            .filter_map(|id| {
                state
                    .metrics
                    .get_stream_metrics(id)
                    .map(|metrics| (id.clone(), metrics))
            })
            .collect();
        QosSnapshot {
            generated_at,
            mode: state.mode,
            epsilon: state.learner.epsilon(),
            analytics: state.analytics.export_snapshot(),
            strategies: StrategyMode::ALL
                .into_iter()
                .map(|mode| (mode, state.strategy_stats[mode.index()].report()))
                .collect(),
            live_metrics,
        }
    }
}
