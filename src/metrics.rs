//! Per-stream rolling QoS metrics.
//!
//! Every stream keeps bounded windows of the shaped packets it was delivered: latency,
//! throughput, loss and jitter. Jitter is the absolute difference between the two most
//! recent latency observations of the stream, so the first packet records no jitter.

use crate::packet::PacketRecord;
use crate::window::RollingWindow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default number of samples kept per metric window.
pub const DEFAULT_METRICS_WINDOW: usize = 100;

/// Rolling statistics for a single stream.
#[derive(Debug, Clone)]
pub struct StreamSeries {
    pub packet_count: u64,
    latency: RollingWindow<f64>,
    throughput: RollingWindow<f64>,
    packet_loss: RollingWindow<f64>,
    jitter: RollingWindow<f64>,
}

impl StreamSeries {
    pub fn new(window: usize) -> Self {
        Self {
            packet_count: 0,
            latency: RollingWindow::new(window),
            throughput: RollingWindow::new(window),
            packet_loss: RollingWindow::new(window),
            jitter: RollingWindow::new(window),
        }
    }

    /// Record one shaped packet.
    pub fn record(&mut self, packet: &PacketRecord) {
        self.packet_count += 1;
        if let Some(previous) = self.latency.latest().copied() {
            self.jitter.push((packet.latency - previous).abs());
        }
        self.latency.push(packet.latency);
        self.throughput.push(packet.data_rate);
        self.packet_loss.push(packet.packet_loss);
    }

    pub fn latency(&self) -> &RollingWindow<f64> {
        &self.latency
    }

    pub fn throughput(&self) -> &RollingWindow<f64> {
        &self.throughput
    }

    pub fn packet_loss(&self) -> &RollingWindow<f64> {
        &self.packet_loss
    }

    pub fn jitter(&self) -> &RollingWindow<f64> {
        &self.jitter
    }

    pub fn snapshot(&self) -> StreamMetrics {
        StreamMetrics {
            packet_count: self.packet_count,
            avg_latency: self.latency.mean(),
            avg_throughput: self.throughput.mean(),
            avg_packet_loss: self.packet_loss.mean(),
            avg_jitter: self.jitter.mean(),
        }
    }
}

/// Window averages reported for a stream. Empty windows report 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamMetrics {
    pub packet_count: u64,
    pub avg_latency: f64,
    pub avg_throughput: f64,
    pub avg_packet_loss: f64,
    pub avg_jitter: f64,
}

/// Per-stream metrics keyed by stream id.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    streams: HashMap<String, StreamSeries>,
    window: usize,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_WINDOW)
    }
}

impl MetricsCollector {
    pub fn new(window: usize) -> Self {
        Self {
            streams: HashMap::new(),
            window: window.max(1),
        }
    }

    /// Start (or restart) tracking a stream with empty windows.
    pub fn initialize_stream(&mut self, stream_id: &str) {
        self.streams
            .insert(stream_id.to_string(), StreamSeries::new(self.window));
    }

    /// Record a shaped packet; a stream seen for the first time is initialised here.
    pub fn update_metrics(&mut self, stream_id: &str, packet: &PacketRecord) {
        let window = self.window;
        self.streams
            .entry(stream_id.to_string())
            .or_insert_with(|| StreamSeries::new(window))
            .record(packet);
    }

    /// Window averages, or `None` for a stream that was never tracked.
    pub fn get_stream_metrics(&self, stream_id: &str) -> Option<StreamMetrics> {
        self.streams.get(stream_id).map(StreamSeries::snapshot)
    }

    pub fn series(&self, stream_id: &str) -> Option<&StreamSeries> {
        self.streams.get(stream_id)
    }

    pub fn clear_metrics(&mut self, stream_id: &str) {
        self.streams.remove(stream_id);
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}
