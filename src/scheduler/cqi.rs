//! Channel-quality scheduler: stateless per-packet scaling by the reported CQI.

use crate::error::{QosError, Result};
use crate::packet::PacketRecord;

/// Scales rate up and latency/loss down with channel quality.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelQualityScheduler;

impl ChannelQualityScheduler {
    pub fn new() -> Self {
        ChannelQualityScheduler
    }

    /// Shape a packet by its CQI. A CQI outside `(0, 1]` is rejected, never clamped.
    pub fn schedule(&self, packet: &PacketRecord) -> Result<PacketRecord> {
        let cqi = packet.cqi;
        if !cqi.is_finite() || cqi <= 0.0 || cqi > 1.0 {
            return Err(QosError::invalid("cqi", "must be within (0, 1]"));
        }
        Ok(packet.with_shaping(
            packet.data_rate * cqi,
            packet.latency / cqi,
            packet.packet_loss / cqi,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::sample_packet;

    #[test]
    fn perfect_channel_is_identity() {
        let mut packet = sample_packet("s");
        packet.cqi = 1.0;
        let shaped = ChannelQualityScheduler::new().schedule(&packet).unwrap();
        assert_eq!(shaped.data_rate, packet.data_rate);
        assert_eq!(shaped.latency, packet.latency);
        assert_eq!(shaped.packet_loss, packet.packet_loss);
    }

    #[test]
    fn poor_channel_degrades_packet() {
        let packet = sample_packet("s"); // cqi 0.5
        let shaped = ChannelQualityScheduler::new().schedule(&packet).unwrap();
        assert_eq!(shaped.data_rate, 5.0);
        assert_eq!(shaped.latency, 40.0);
        assert_eq!(shaped.packet_loss, 4.0);
    }

    #[test]
    fn zero_cqi_is_rejected() {
        let mut packet = sample_packet("s");
        packet.cqi = 0.0;
        let err = ChannelQualityScheduler::new().schedule(&packet).unwrap_err();
        assert!(err.is_rejected_input());
    }
}
