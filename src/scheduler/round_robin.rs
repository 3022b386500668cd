//! Round Robin Scheduler
//!
//! Registered streams take turns holding the "served" slot for a fixed quantum of
//! processed packets. The rotation is global: every packet processed under this strategy
//! advances the slice counter exactly once, whichever stream it belongs to.
//!
//! Algorithm:
//! 1. If the current slice is exhausted (or nothing is being served), move the head of the
//!    rotation to the back and make it the served stream
//! 2. Count one packet against the slice
//! 3. Boost packets of the served stream, penalize everything else
//! 4. Scale the result by the stream's priority multiplier

use crate::packet::PacketRecord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Round-robin tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundRobinConfig {
    /// Packets served per turn.
    pub time_slice: usize,
}

impl Default for RoundRobinConfig {
    fn default() -> Self {
        Self { time_slice: 5 }
    }
}

/// Fixed-quantum rotation among registered streams.
#[derive(Debug)]
pub struct RoundRobinScheduler {
    /// Ordered rotation; the head is the next stream to be granted a slice.
    rotation: VecDeque<String>,
    time_slice: usize,
    /// Packets counted against the current slice.
    current_slice: usize,
    current_stream: Option<String>,
}

impl RoundRobinScheduler {
    pub fn new(config: &RoundRobinConfig) -> Self {
        Self {
            rotation: VecDeque::new(),
            time_slice: config.time_slice.max(1),
            current_slice: 0,
            current_stream: None,
        }
    }

    /// Append a stream to the rotation; already-registered streams keep their place.
    pub fn add_stream(&mut self, stream_id: &str) {
        if !self.contains(stream_id) {
            self.rotation.push_back(stream_id.to_string());
        }
    }

    /// Drop a stream from the rotation.
    ///
    /// Removing the served stream resets the cursor so the next call starts a fresh slice
    /// on the new head.
    pub fn remove_stream(&mut self, stream_id: &str) {
        self.rotation.retain(|id| id != stream_id);
        if self.current_stream.as_deref() == Some(stream_id) {
            self.current_stream = None;
            self.current_slice = 0;
        }
    }

    pub fn contains(&self, stream_id: &str) -> bool {
        self.rotation.iter().any(|id| id == stream_id)
    }

    pub fn len(&self) -> usize {
        self.rotation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotation.is_empty()
    }

    pub fn current_stream(&self) -> Option<&str> {
        self.current_stream.as_deref()
    }

    /// Advance the rotation by one packet and return the served stream.
    pub fn get_next_stream(&mut self) -> Option<&str> {
        if self.rotation.is_empty() {
            return None;
        }
        if self.current_slice >= self.time_slice || self.current_stream.is_none() {
            if let Some(head) = self.rotation.pop_front() {
                self.current_stream = Some(head.clone());
                self.rotation.push_back(head);
            }
            self.current_slice = 0;
        }
        self.current_slice += 1;
        self.current_stream.as_deref()
    }

    /// Shape a packet depending on whether its stream holds the current slice.
    pub fn apply(packet: &PacketRecord, is_current: bool, priority: u8) -> PacketRecord {
        let (rate, latency, loss) = if is_current {
            (
                packet.data_rate * 1.5,
                packet.latency * 0.8,
                packet.packet_loss * 0.8,
            )
        } else {
            (
                packet.data_rate * 0.8,
                packet.latency * 1.2,
                packet.packet_loss * 1.2,
            )
        };
        let pm = 1.0 + f64::from(priority) * 0.2;
        packet.with_shaping(rate * pm, latency / pm, loss / pm)
    }

    /// Advance the rotation and shape the packet of `stream_id` accordingly.
    pub fn schedule(&mut self, stream_id: &str, packet: &PacketRecord, priority: u8) -> (PacketRecord, bool) {
        let is_current = self.get_next_stream() == Some(stream_id);
        (Self::apply(packet, is_current, priority), is_current)
    }
}
