//! Packet representation shared by all scheduling strategies.

use crate::error::{QosError, Result};
use crate::priority::{TrafficLoad, TrafficType};
use serde::{Deserialize, Serialize};

/// One observed packet's QoS characteristics.
///
/// Records are never mutated in place: every strategy returns a new record reflecting
/// its scheduling decision, so the producer's original observation stays available
/// for the other strategies in comparison runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub stream_id: String,
    pub user_id: u32,
    /// Offered data rate in Mbps.
    pub data_rate: f64,
    /// One-way latency in milliseconds.
    pub latency: f64,
    /// Loss percentage (0-100).
    pub packet_loss: f64,
    pub traffic_type: TrafficType,
    pub traffic_load: TrafficLoad,
    /// Channel quality indicator in `(0, 1]`.
    pub cqi: f64,
    /// Capture time in seconds.
    pub timestamp: f64,
}

impl PacketRecord {
    /// Decode and validate a single JSON packet document.
    pub fn from_json(document: &str) -> Result<PacketRecord> {
        let packet: PacketRecord = serde_json::from_str(document)?;
        packet.validate()?;
        Ok(packet)
    }

    /// Check the producer contract.
    ///
    /// Rejecting is preferred over clamping: a defaulted field would silently skew
    /// every aggregate the record flows into.
    pub fn validate(&self) -> Result<()> {
        if !self.data_rate.is_finite() || self.data_rate <= 0.0 {
            return Err(QosError::invalid("data_rate", "must be a positive number"));
        }
        if !self.latency.is_finite() || self.latency < 0.0 {
            return Err(QosError::invalid("latency", "must be non-negative"));
        }
        if !(0.0..=100.0).contains(&self.packet_loss) {
            return Err(QosError::invalid("packet_loss", "must be within 0..=100"));
        }
        if !self.cqi.is_finite() || self.cqi <= 0.0 || self.cqi > 1.0 {
            return Err(QosError::invalid("cqi", "must be within (0, 1]"));
        }
        if !self.timestamp.is_finite() {
            return Err(QosError::invalid("timestamp", "must be finite"));
        }
        Ok(())
    }

    /// Copy of this record with the three shaped characteristics replaced.
    pub fn with_shaping(&self, data_rate: f64, latency: f64, packet_loss: f64) -> PacketRecord {
        PacketRecord {
            data_rate,
            latency,
            packet_loss,
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_packet(stream_id: &str) -> PacketRecord {
    PacketRecord {
        stream_id: stream_id.to_string(),
        user_id: 3,
        data_rate: 10.0,
        latency: 20.0,
        packet_loss: 2.0,
        traffic_type: TrafficType::Instagram,
        traffic_load: TrafficLoad::Moderate,
        cqi: 0.5,
        timestamp: 1_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_packet_passes() {
        assert!(sample_packet("s1").validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let mut p = sample_packet("s1");
        p.cqi = 0.0;
        assert!(matches!(
            p.validate(),
            Err(QosError::InvalidPacket { field: "cqi", .. })
        ));

        let mut p = sample_packet("s1");
        p.cqi = 1.5;
        assert!(p.validate().is_err());

        let mut p = sample_packet("s1");
        p.latency = -1.0;
        assert!(p.validate().is_err());

        let mut p = sample_packet("s1");
        p.data_rate = 0.0;
        assert!(p.validate().is_err());

        let mut p = sample_packet("s1");
        p.packet_loss = 101.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn decodes_json_and_rejects_missing_fields() {
        let doc = r#"{"stream_id":"a","user_id":1,"data_rate":50.0,"latency":15.0,
            "packet_loss":1.2,"traffic_type":"YouTube","traffic_load":"heavy",
            "cqi":0.8,"timestamp":12.5}"#;
        let packet = PacketRecord::from_json(doc).unwrap();
        assert_eq!(packet.traffic_type, TrafficType::YouTube);
        assert_eq!(packet.traffic_load, TrafficLoad::Heavy);

        let missing = r#"{"stream_id":"a","user_id":1,"data_rate":50.0}"#;
        let err = PacketRecord::from_json(missing).unwrap_err();
        assert!(err.is_rejected_input());
    }

    #[test]
    fn shaping_leaves_original_untouched() {
        let p = sample_packet("s1");
        let shaped = p.with_shaping(1.0, 2.0, 3.0);
        assert_eq!(p.data_rate, 10.0);
        assert_eq!(shaped.data_rate, 1.0);
        assert_eq!(shaped.stream_id, p.stream_id);
    }
}
