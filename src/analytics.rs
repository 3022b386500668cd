//! Comparative analytics across strategies, streams and traffic types.
//!
//! Every shaped packet is ingested tagged with the strategy that produced it. The engine
//! keeps a rolling window per (strategy, stream) pair and a bounded global history, and
//! answers comparison queries from them.
//!
//! Sign conventions: an improvement of candidate A over baseline B is positive when A is
//! better. Latency, loss and jitter use `(B - A) / B * 100`; throughput uses
//! `(A - B) / B * 100`. A zero baseline yields 0.

use crate::packet::PacketRecord;
use crate::priority::TrafficType;
use crate::scheduler::StrategyMode;
use crate::window::{mean, std_dev, variance, RollingWindow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Loss percentage under which a packet counts as successfully delivered.
const SUCCESS_LOSS_THRESHOLD: f64 = 1.0;

/// Analytics tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Samples kept per (strategy, stream) window.
    pub window_size: usize,
    /// Entries kept in the global history.
    pub history_capacity: usize,
    /// History entries included in an exported snapshot.
    pub export_history: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            history_capacity: 1000,
            export_history: 100,
        }
    }
}

/// Improvement of `candidate` over `baseline` for a metric where lower is better.
pub fn improvement_lower_is_better(candidate: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (baseline - candidate) / baseline * 100.0
}

/// Improvement of `candidate` over `baseline` for a metric where higher is better.
pub fn improvement_higher_is_better(candidate: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (candidate - baseline) / baseline * 100.0
}

/// `1 - min(1, stdev / mean)`; 0 for an empty sequence or a zero mean.
pub fn stability_score(values: &[f64]) -> f64 {
    let m = mean(values.iter().copied());
    if values.is_empty() || m == 0.0 {
        return 0.0;
    }
    1.0 - (std_dev(values) / m).min(1.0)
}

/// Mean of first differences (positive means increasing); 0 below two samples.
pub fn trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    mean(values.windows(2).map(|pair| pair[1] - pair[0]))
}

/// Averages of the four compared metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModeAverages {
    pub avg_latency: f64,
    pub avg_throughput: f64,
    pub avg_packet_loss: f64,
    pub avg_jitter: f64,
}

/// Percentage improvements of one strategy over the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Improvements {
    pub avg_latency: f64,
    pub avg_throughput: f64,
    pub avg_packet_loss: f64,
    pub avg_jitter: f64,
    pub overall: f64,
}

impl Improvements {
    pub fn between(candidate: &ModeAverages, baseline: &ModeAverages) -> Improvements {
        let avg_latency = improvement_lower_is_better(candidate.avg_latency, baseline.avg_latency);
        let avg_packet_loss =
            improvement_lower_is_better(candidate.avg_packet_loss, baseline.avg_packet_loss);
        let avg_jitter = improvement_lower_is_better(candidate.avg_jitter, baseline.avg_jitter);
        let avg_throughput =
            improvement_higher_is_better(candidate.avg_throughput, baseline.avg_throughput);
        let overall = (avg_throughput - avg_latency - avg_packet_loss - avg_jitter) / 4.0;
        Improvements {
            avg_latency,
            avg_throughput,
            avg_packet_loss,
            avg_jitter,
            overall,
        }
    }
}

/// Delivery counters for one (strategy, stream) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_packets: u64,
    /// Percentage of packets with loss under 1%.
    pub success_rate: f64,
    pub uptime_secs: f64,
    pub traffic_type: TrafficType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StabilityMetrics {
    pub latency_variance: f64,
    pub throughput_stability: f64,
    pub packet_loss_trend: f64,
}

/// Everything reported for one strategy on one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeStreamReport {
    pub current_metrics: ModeAverages,
    pub performance_stats: PerformanceStats,
    pub stability_metrics: StabilityMetrics,
}

/// Per-stream comparison across strategies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamComparison {
    pub stream_id: String,
    pub modes: BTreeMap<StrategyMode, ModeStreamReport>,
    /// Improvement of each strategy over the round-robin baseline.
    pub improvements: BTreeMap<StrategyMode, Improvements>,
}

/// Per-strategy averages with improvements over the baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModeBreakdown {
    pub modes: BTreeMap<StrategyMode, ModeAverages>,
    pub improvements: BTreeMap<StrategyMode, Improvements>,
}

impl ModeBreakdown {
    fn from_modes(modes: BTreeMap<StrategyMode, ModeAverages>) -> Self {
        let improvements = improvements_over_baseline(&modes);
        ModeBreakdown {
            modes,
            improvements,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub latency: Vec<f64>,
    pub throughput: Vec<f64>,
    pub packet_loss: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_packets_processed: u64,
    pub active_streams: usize,
    /// Overall improvement of the adaptive scheduler over round robin.
    pub average_improvement: f64,
}

/// Comparison aggregated over every stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallComparison {
    #[serde(flatten)]
    pub breakdown: ModeBreakdown,
    pub by_traffic_type: BTreeMap<TrafficType, ModeBreakdown>,
    pub time_series_analysis: BTreeMap<StrategyMode, TimeSeries>,
    pub performance_summary: PerformanceSummary,
}

/// Answer to a comparison query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Comparison {
    Stream(StreamComparison),
    Overall(OverallComparison),
}

/// One ingested packet as kept in the global history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub sequence: u64,
    pub timestamp: f64,
    pub stream_id: String,
    pub mode: StrategyMode,
    pub traffic_type: TrafficType,
    pub latency: f64,
    pub throughput: f64,
    pub packet_loss: f64,
}

/// Structured report covering every stream and the recent history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub overall_comparison: OverallComparison,
    pub stream_metrics: BTreeMap<String, StreamComparison>,
    pub traffic_type_analysis: BTreeMap<TrafficType, ModeBreakdown>,
    pub comparison_history: Vec<HistoryEntry>,
}

/// Rolling state for one (strategy, stream) pair.
#[derive(Debug, Clone)]
struct ModeStreamRecord {
    total_packets: u64,
    success_packets: u64,
    latency: RollingWindow<f64>,
    throughput: RollingWindow<f64>,
    packet_loss: RollingWindow<f64>,
    jitter: RollingWindow<f64>,
    first_seen: Instant,
    traffic_type: TrafficType,
}

impl ModeStreamRecord {
    fn new(window: usize, traffic_type: TrafficType) -> Self {
        Self {
            total_packets: 0,
            success_packets: 0,
            latency: RollingWindow::new(window),
            throughput: RollingWindow::new(window),
            packet_loss: RollingWindow::new(window),
            jitter: RollingWindow::new(window),
            first_seen: Instant::now(),
            traffic_type,
        }
    }

    fn record(&mut self, packet: &PacketRecord) {
        self.total_packets += 1;
        if packet.packet_loss < SUCCESS_LOSS_THRESHOLD {
            self.success_packets += 1;
        }
        if let Some(previous) = self.latency.latest().copied() {
            self.jitter.push((packet.latency - previous).abs());
        }
        self.latency.push(packet.latency);
        self.throughput.push(packet.data_rate);
        self.packet_loss.push(packet.packet_loss);
    }

    fn averages(&self) -> ModeAverages {
        ModeAverages {
            avg_latency: self.latency.mean(),
            avg_throughput: self.throughput.mean(),
            avg_packet_loss: self.packet_loss.mean(),
            avg_jitter: self.jitter.mean(),
        }
    }

    fn report(&self) -> ModeStreamReport {
        let success_rate = if self.total_packets > 0 {
            self.success_packets as f64 / self.total_packets as f64 * 100.0
        } else {
            0.0
        };
        ModeStreamReport {
            current_metrics: self.averages(),
            performance_stats: PerformanceStats {
                total_packets: self.total_packets,
                success_rate,
                uptime_secs: self.first_seen.elapsed().as_secs_f64(),
                traffic_type: self.traffic_type,
            },
            stability_metrics: StabilityMetrics {
                latency_variance: variance(&self.latency.to_vec()),
                throughput_stability: stability_score(&self.throughput.to_vec()),
                packet_loss_trend: trend(&self.packet_loss.to_vec()),
            },
        }
    }
}

/// Running sums used to average samples pooled from several records.
#[derive(Default)]
struct PooledSums {
    latency: (f64, usize),
    throughput: (f64, usize),
    packet_loss: (f64, usize),
    jitter: (f64, usize),
}

impl PooledSums {
    fn add(&mut self, record: &ModeStreamRecord) {
        fn fold(acc: &mut (f64, usize), window: &RollingWindow<f64>) {
            acc.0 += window.iter().sum::<f64>();
            acc.1 += window.len();
        }
        fold(&mut self.latency, &record.latency);
        fold(&mut self.throughput, &record.throughput);
        fold(&mut self.packet_loss, &record.packet_loss);
        fold(&mut self.jitter, &record.jitter);
    }

    /// Pooled means, or `None` when no samples were pooled at all.
    fn averages(&self) -> Option<ModeAverages> {
        let total = self.latency.1 + self.throughput.1 + self.packet_loss.1 + self.jitter.1;
        if total == 0 {
            return None;
        }
        let avg = |(sum, count): (f64, usize)| if count == 0 { 0.0 } else { sum / count as f64 };
        Some(ModeAverages {
            avg_latency: avg(self.latency),
            avg_throughput: avg(self.throughput),
            avg_packet_loss: avg(self.packet_loss),
            avg_jitter: avg(self.jitter),
        })
    }
}

fn improvements_over_baseline(
    modes: &BTreeMap<StrategyMode, ModeAverages>,
) -> BTreeMap<StrategyMode, Improvements> {
    let Some(baseline) = modes.get(&StrategyMode::BASELINE) else {
        return BTreeMap::new();
    };
    modes
        .iter()
        .filter(|(mode, _)| **mode != StrategyMode::BASELINE)
        .map(|(mode, averages)| (*mode, Improvements::between(averages, baseline)))
        .collect()
}

/// Cross-strategy comparison engine.
#[derive(Debug, Clone)]
pub struct ComparativeAnalyticsEngine {
    config: AnalyticsConfig,
    /// stream id -> strategy -> rolling record. Entries outlive stream removal so
    /// comparisons still cover retired streams; each holds only bounded windows.
    streams: BTreeMap<String, BTreeMap<StrategyMode, ModeStreamRecord>>,
    traffic_types: BTreeSet<TrafficType>,
    history: RollingWindow<HistoryEntry>,
    next_sequence: u64,
}

impl Default for ComparativeAnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl ComparativeAnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        let history = RollingWindow::new(config.history_capacity);
        Self {
            config,
            streams: BTreeMap::new(),
            traffic_types: BTreeSet::new(),
            history,
            next_sequence: 0,
        }
    }

    /// Ingest a shaped packet produced by `mode` for `stream_id`.
    pub fn record(&mut self, mode: StrategyMode, stream_id: &str, packet: &PacketRecord) {
        let window = self.config.window_size;
        self.streams
            .entry(stream_id.to_string())
            .or_default()
            .entry(mode)
            .or_insert_with(|| ModeStreamRecord::new(window, packet.traffic_type))
            .record(packet);
        self.traffic_types.insert(packet.traffic_type);

        self.history.push(HistoryEntry {
            sequence: self.next_sequence,
            timestamp: packet.timestamp,
            stream_id: stream_id.to_string(),
            mode,
            traffic_type: packet.traffic_type,
            latency: packet.latency,
            throughput: packet.data_rate,
            packet_loss: packet.packet_loss,
        });
        self.next_sequence += 1;
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recent `n` history entries, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn get_comparison(&self, stream_id: Option<&str>) -> Comparison {
        match stream_id {
            Some(id) => Comparison::Stream(self.get_stream_comparison(id)),
            None => Comparison::Overall(self.get_overall_comparison()),
        }
    }

    /// Per-strategy reports for one stream. A stream never seen yields empty maps.
    pub fn get_stream_comparison(&self, stream_id: &str) -> StreamComparison {
        let modes: BTreeMap<StrategyMode, ModeStreamReport> = self
            .streams
            .get(stream_id)
            .map(|records| {
                records
                    .iter()
                    .map(|(mode, record)| (*mode, record.report()))
                    .collect()
            })
            .unwrap_or_default();
        let averages: BTreeMap<StrategyMode, ModeAverages> = modes
            .iter()
            .map(|(mode, report)| (*mode, report.current_metrics))
            .collect();
        StreamComparison {
            stream_id: stream_id.to_string(),
            improvements: improvements_over_baseline(&averages),
            modes,
        }
    }

    pub fn get_overall_comparison(&self) -> OverallComparison {
        let breakdown = self.breakdown(|_| true);
        let performance_summary = PerformanceSummary {
            total_packets_processed: self.total_packets(),
            active_streams: self.streams.len(),
            average_improvement: breakdown
                .improvements
                .get(&StrategyMode::Adaptive)
                .map(|i| i.overall)
                .unwrap_or(0.0),
        };
        OverallComparison {
            breakdown,
            by_traffic_type: self.traffic_type_breakdown(),
            time_series_analysis: self.time_series(),
            performance_summary,
        }
    }

    /// Breakdown per traffic type, for every type seen so far.
    pub fn traffic_type_breakdown(&self) -> BTreeMap<TrafficType, ModeBreakdown> {
        self.traffic_types
            .iter()
            .map(|traffic_type| {
                (
                    *traffic_type,
                    self.breakdown(|record| record.traffic_type == *traffic_type),
                )
            })
            .collect()
    }

    pub fn export_snapshot(&self) -> AnalyticsSnapshot {
        let stream_metrics = self
            .streams
            .keys()
            .map(|id| (id.clone(), self.get_stream_comparison(id)))
            .collect();
        AnalyticsSnapshot {
            overall_comparison: self.get_overall_comparison(),
            stream_metrics,
            traffic_type_analysis: self.traffic_type_breakdown(),
            comparison_history: self.recent_history(self.config.export_history),
        }
    }

    fn total_packets(&self) -> u64 {
        self.streams
            .values()
            .flat_map(|records| records.values())
            .map(|record| record.total_packets)
            .sum()
    }

    /// Pool samples of the records accepted by `filter`, per strategy.
    fn breakdown(&self, filter: impl Fn(&ModeStreamRecord) -> bool) -> ModeBreakdown {
        let mut pooled: BTreeMap<StrategyMode, PooledSums> = BTreeMap::new();
        for records in self.streams.values() {
            for (mode, record) in records {
                if filter(record) {
                    pooled.entry(*mode).or_default().add(record);
                }
            }
        }
        let modes = pooled
            .into_iter()
            .filter_map(|(mode, sums)| sums.averages().map(|averages| (mode, averages)))
            .collect();
        ModeBreakdown::from_modes(modes)
    }

    fn time_series(&self) -> BTreeMap<StrategyMode, TimeSeries> {
        let mut series: BTreeMap<StrategyMode, TimeSeries> = BTreeMap::new();
        for entry in self.history.iter() {
            let s = series.entry(entry.mode).or_default();
            s.latency.push(entry.latency);
            s.throughput.push(entry.throughput);
            s.packet_loss.push(entry.packet_loss);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::sample_packet;

    fn averages(latency: f64, throughput: f64, loss: f64, jitter: f64) -> ModeAverages {
        ModeAverages {
            avg_latency: latency,
            avg_throughput: throughput,
            avg_packet_loss: loss,
            avg_jitter: jitter,
        }
    }

    fn shaped(stream_id: &str, latency: f64, data_rate: f64, loss: f64) -> PacketRecord {
        let mut p = sample_packet(stream_id);
        p.latency = latency;
        p.data_rate = data_rate;
        p.packet_loss = loss;
        p
    }

    #[test]
    fn latency_improvement_of_forty_over_fifty_is_twenty_percent() {
        assert!((improvement_lower_is_better(40.0, 50.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn zero_baseline_yields_zero_improvement() {
        assert_eq!(improvement_lower_is_better(10.0, 0.0), 0.0);
        assert_eq!(improvement_higher_is_better(10.0, 0.0), 0.0);
        let i = Improvements::between(&averages(1.0, 1.0, 1.0, 1.0), &ModeAverages::default());
        assert_eq!(i, Improvements::default());
    }

    #[test]
    fn overall_improvement_sign_convention() {
        let rl = averages(40.0, 12.0, 1.0, 2.0);
        let rr = averages(50.0, 10.0, 2.0, 2.0);
        let i = Improvements::between(&rl, &rr);
        assert!((i.avg_latency - 20.0).abs() < 1e-12);
        assert!((i.avg_throughput - 20.0).abs() < 1e-12);
        assert!((i.avg_packet_loss - 50.0).abs() < 1e-12);
        assert_eq!(i.avg_jitter, 0.0);
        assert!((i.overall - (20.0 - 20.0 - 50.0 - 0.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn stability_and_trend() {
        assert_eq!(stability_score(&[]), 0.0);
        assert_eq!(stability_score(&[0.0, 0.0]), 0.0);
        assert_eq!(stability_score(&[5.0, 5.0, 5.0]), 1.0);
        // mean 2, stdev 2 => ratio 1 => score 0
        assert_eq!(stability_score(&[0.0, 4.0]), 0.0);
        assert_eq!(trend(&[1.0]), 0.0);
        assert_eq!(trend(&[1.0, 3.0, 7.0]), 3.0);
        assert_eq!(trend(&[9.0, 6.0, 3.0]), -3.0);
    }

    #[test]
    fn stream_comparison_reports_each_mode() {
        let mut engine = ComparativeAnalyticsEngine::default();
        engine.record(StrategyMode::Adaptive, "s1", &shaped("s1", 40.0, 10.0, 0.5));
        engine.record(StrategyMode::Adaptive, "s1", &shaped("s1", 40.0, 10.0, 2.0));
        engine.record(StrategyMode::RoundRobin, "s1", &shaped("s1", 50.0, 10.0, 2.0));

        let comparison = engine.get_stream_comparison("s1");
        let rl = &comparison.modes[&StrategyMode::Adaptive];
        assert_eq!(rl.performance_stats.total_packets, 2);
        assert_eq!(rl.performance_stats.success_rate, 50.0);
        assert_eq!(rl.current_metrics.avg_latency, 40.0);
        assert_eq!(rl.stability_metrics.packet_loss_trend, 1.5);
        assert_eq!(rl.stability_metrics.throughput_stability, 1.0);

        let improvement = comparison.improvements[&StrategyMode::Adaptive];
        assert!((improvement.avg_latency - 20.0).abs() < 1e-12);
        assert!(!comparison.improvements.contains_key(&StrategyMode::RoundRobin));
    }

    #[test]
    fn unknown_stream_comparison_is_empty() {
        let engine = ComparativeAnalyticsEngine::default();
        let comparison = engine.get_stream_comparison("ghost");
        assert!(comparison.modes.is_empty());
        assert!(comparison.improvements.is_empty());
    }

    #[test]
    fn improvements_require_baseline() {
        let mut engine = ComparativeAnalyticsEngine::default();
        engine.record(StrategyMode::Adaptive, "s1", &shaped("s1", 40.0, 10.0, 0.5));
        let overall = engine.get_overall_comparison();
        assert!(overall.breakdown.modes.contains_key(&StrategyMode::Adaptive));
        assert!(overall.breakdown.improvements.is_empty());
        assert_eq!(overall.performance_summary.average_improvement, 0.0);
    }

    #[test]
    fn overall_pools_samples_across_streams() {
        let mut engine = ComparativeAnalyticsEngine::default();
        engine.record(StrategyMode::RoundRobin, "a", &shaped("a", 40.0, 10.0, 1.0));
        engine.record(StrategyMode::RoundRobin, "b", &shaped("b", 60.0, 30.0, 3.0));
        engine.record(StrategyMode::RoundRobin, "b", &shaped("b", 80.0, 30.0, 3.0));
        engine.record(StrategyMode::Adaptive, "a", &shaped("a", 30.0, 20.0, 1.0));

        let overall = engine.get_overall_comparison();
        let rr = overall.breakdown.modes[&StrategyMode::RoundRobin];
        assert_eq!(rr.avg_latency, 60.0);
        assert!((rr.avg_throughput - 70.0 / 3.0).abs() < 1e-12);
        // only stream b has consecutive RR latencies
        assert_eq!(rr.avg_jitter, 20.0);
        assert_eq!(overall.performance_summary.total_packets_processed, 4);
        assert_eq!(overall.performance_summary.active_streams, 2);
        assert_eq!(
            overall.performance_summary.average_improvement,
            overall.breakdown.improvements[&StrategyMode::Adaptive].overall
        );
        assert_eq!(overall.time_series_analysis[&StrategyMode::RoundRobin].latency, vec![40.0, 60.0, 80.0]);
    }

    #[test]
    fn traffic_type_breakdown_groups_streams() {
        let mut engine = ComparativeAnalyticsEngine::default();
        let mut video = shaped("v", 20.0, 40.0, 0.1);
        video.traffic_type = TrafficType::YouTube;
        engine.record(StrategyMode::RoundRobin, "v", &video);
        engine.record(StrategyMode::RoundRobin, "i", &shaped("i", 30.0, 5.0, 0.1));

        let by_type = engine.traffic_type_breakdown();
        assert_eq!(by_type.len(), 2);
        assert_eq!(by_type[&TrafficType::YouTube].modes[&StrategyMode::RoundRobin].avg_throughput, 40.0);
        assert_eq!(by_type[&TrafficType::Instagram].modes[&StrategyMode::RoundRobin].avg_latency, 30.0);
    }

    #[test]
    fn history_and_windows_are_bounded() {
        let config = AnalyticsConfig {
            window_size: 5,
            history_capacity: 20,
            export_history: 3,
        };
        let mut engine = ComparativeAnalyticsEngine::new(config);
        for i in 0..100 {
            engine.record(StrategyMode::Adaptive, "s", &shaped("s", i as f64, 1.0, 0.0));
        }
        assert_eq!(engine.history_len(), 20);
        let snapshot = engine.export_snapshot();
        let sequences: Vec<u64> = snapshot.comparison_history.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![97, 98, 99]);

        let report = &snapshot.stream_metrics["s"].modes[&StrategyMode::Adaptive];
        assert_eq!(report.performance_stats.total_packets, 100);
        // window holds latencies 95..=99
        assert_eq!(report.current_metrics.avg_latency, 97.0);
    }

    #[test]
    fn snapshot_serializes() {
        let mut engine = ComparativeAnalyticsEngine::default();
        engine.record(StrategyMode::RoundRobin, "s", &shaped("s", 50.0, 10.0, 0.0));
        engine.record(StrategyMode::Adaptive, "s", &shaped("s", 40.0, 10.0, 0.0));
        let json = serde_json::to_value(engine.export_snapshot()).unwrap();
        let latency = &json["overall_comparison"]["improvements"]["RL"]["avg_latency"];
        assert!((latency.as_f64().unwrap() - 20.0).abs() < 1e-9);
        assert!(json["stream_metrics"]["s"]["modes"]["RR"].is_object());
    }
}
