//! Scheduling strategies compared by the simulator.

pub mod adaptive;
pub mod cqi;
pub mod round_robin;
pub mod stats;

pub use adaptive::{AdaptiveLearningScheduler, BandwidthTier, LearningConfig, LearningDecision, ValueTable};
pub use cqi::ChannelQualityScheduler;
pub use round_robin::{RoundRobinConfig, RoundRobinScheduler};
pub use stats::{SchedulerStatistics, StrategyReport, StrategyStats};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy that produced a shaped packet.
///
/// Ordering is stable and used for deterministic report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrategyMode {
    #[serde(rename = "RL")]
    Adaptive,
    #[serde(rename = "RR")]
    RoundRobin,
    #[serde(rename = "CQI")]
    ChannelQuality,
}

impl StrategyMode {
    pub const ALL: [StrategyMode; 3] = [
        StrategyMode::Adaptive,
        StrategyMode::RoundRobin,
        StrategyMode::ChannelQuality,
    ];

    /// Reference strategy improvements are measured against.
    pub const BASELINE: StrategyMode = StrategyMode::RoundRobin;

    pub const fn index(self) -> usize {
        match self {
            StrategyMode::Adaptive => 0,
            StrategyMode::RoundRobin => 1,
            StrategyMode::ChannelQuality => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            StrategyMode::Adaptive => "RL",
            StrategyMode::RoundRobin => "RR",
            StrategyMode::ChannelQuality => "CQI",
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
