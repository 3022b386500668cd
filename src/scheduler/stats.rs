//! Aggregate per-strategy statistics.
//!
//! Each strategy keeps lifetime totals of what it delivered, how evenly it served the
//! user-density buckets, and two bounded histories: a statistics snapshot per packet and
//! per-second traffic-type counts keyed on the packet timestamps.

use crate::packet::PacketRecord;
use crate::priority::{fairness_index, fairness_penalty, DensityTable, LoadTable, TrafficType, UserDensity};
use crate::window::RollingWindow;
use serde::Serialize;
use std::collections::BTreeMap;

/// Snapshots retained in the statistics history.
pub const STATS_HISTORY_CAPACITY: usize = 100;

/// Finished one-second traffic-type buckets retained.
pub const TRAFFIC_HISTORY_CAPACITY: usize = 60;

/// Lifetime summary of one strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SchedulerStatistics {
    pub throughput: f64,
    pub average_latency: f64,
    pub average_packet_loss: f64,
    pub fairness_index: f64,
    pub count: u64,
}

/// Traffic-type tally for one whole second of packet time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficCountBucket {
    pub second: i64,
    pub counts: BTreeMap<TrafficType, u64>,
}

#[derive(Debug, Clone)]
pub struct StrategyStats {
    count: u64,
    total_throughput: f64,
    total_latency: f64,
    total_packet_loss: f64,
    density_counts: DensityTable<u64>,
    load_counts: LoadTable<u64>,
    history: RollingWindow<SchedulerStatistics>,
    open_bucket: Option<TrafficCountBucket>,
    traffic_history: RollingWindow<TrafficCountBucket>,
}

impl Default for StrategyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            total_throughput: 0.0,
            total_latency: 0.0,
            total_packet_loss: 0.0,
            density_counts: DensityTable::default(),
            load_counts: LoadTable::default(),
            history: RollingWindow::new(STATS_HISTORY_CAPACITY),
            open_bucket: None,
            traffic_history: RollingWindow::new(TRAFFIC_HISTORY_CAPACITY),
        }
    }

    /// Account for one shaped packet delivered to a stream of `density`.
    pub fn record(&mut self, packet: &PacketRecord, density: UserDensity) {
        self.count += 1;
        self.total_throughput += packet.data_rate;
        self.total_latency += packet.latency;
        self.total_packet_loss += packet.packet_loss;
        self.density_counts[density] += 1;
        self.load_counts[packet.traffic_load] += 1;
        self.count_traffic_type(packet);

        let snapshot = self.compute_statistics();
        self.history.push(snapshot);
    }

    fn count_traffic_type(&mut self, packet: &PacketRecord) {
        let second = packet.timestamp.floor() as i64;
        let rollover = matches!(&self.open_bucket, Some(bucket) if second > bucket.second);
        if rollover {
            if let Some(finished) = self.open_bucket.take() {
                self.traffic_history.push(finished);
            }
        }
        let bucket = self.open_bucket.get_or_insert_with(|| TrafficCountBucket {
            second,
            counts: BTreeMap::new(),
        });
        *bucket.counts.entry(packet.traffic_type).or_insert(0) += 1;
    }

    pub fn compute_statistics(&self) -> SchedulerStatistics {
        if self.count == 0 {
            return SchedulerStatistics::default();
        }
        let n = self.count as f64;
        SchedulerStatistics {
            throughput: self.total_throughput / n,
            average_latency: self.total_latency / n,
            average_packet_loss: self.total_packet_loss / n,
            fairness_index: fairness_index(&self.density_counts),
            count: self.count,
        }
    }

    /// Spread of service across density buckets, fed into the learner's reward.
    pub fn fairness_penalty(&self) -> f64 {
        fairness_penalty(&self.density_counts)
    }

    pub fn density_counts(&self) -> &DensityTable<u64> {
        &self.density_counts
    }

    pub fn load_counts(&self) -> &LoadTable<u64> {
        &self.load_counts
    }

    pub fn history(&self) -> impl Iterator<Item = &SchedulerStatistics> {
        self.history.iter()
    }

    /// Finished traffic-type buckets, oldest first.
    pub fn traffic_history(&self) -> impl Iterator<Item = &TrafficCountBucket> {
        self.traffic_history.iter()
    }

    pub fn report(&self) -> StrategyReport {
        StrategyReport {
            statistics: self.compute_statistics(),
            density_counts: self.density_counts.clone(),
            load_counts: self.load_counts.clone(),
            history: self.history.iter().copied().collect(),
            traffic_type_history: self.traffic_history.iter().cloned().collect(),
        }
    }
}

/// Serializable view of a strategy's aggregate statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub statistics: SchedulerStatistics,
    pub density_counts: DensityTable<u64>,
    pub load_counts: LoadTable<u64>,
    pub history: Vec<SchedulerStatistics>,
    pub traffic_type_history: Vec<TrafficCountBucket>,
}
