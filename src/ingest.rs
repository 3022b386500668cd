//! Background packet ingestion.
//!
//! Producers on any thread push packets into a bounded channel; a single named worker
//! drains it into the shared [`QosManager`]. Back-pressure comes from the channel bound.
//! The worker exits once every sender has been dropped, or once the owner stops it, and
//! reports what it saw. Stopping never waits on producers that still hold senders.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

use crate::error::{QosError, Result};
use crate::manager::QosManager;
use crate::packet::PacketRecord;

/// Default number of in-flight packets between producers and the worker.
pub const DEFAULT_INGEST_CAPACITY: usize = 1024;

/// Totals accumulated by the ingest worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Packets shaped for a registered stream.
    pub processed: u64,
    /// Packets for unknown streams, returned unmodified.
    pub passed_through: u64,
    /// Packets that failed validation.
    pub rejected: u64,
}

impl IngestReport {
    pub fn total(&self) -> u64 {
        self.processed + self.passed_through + self.rejected
    }

    fn ingest(&mut self, manager: &QosManager, packet: &PacketRecord) {
        match manager.process(&packet.stream_id, packet) {
            Ok((_, Some(_))) => self.processed += 1,
            Ok((_, None)) => self.passed_through += 1,
            // logged by the manager
            Err(_) => self.rejected += 1,
        }
    }
}

/// Cloneable producer side of a [`PacketIngest`].
#[derive(Debug, Clone)]
pub struct IngestSender {
    tx: Sender<PacketRecord>,
}

impl IngestSender {
    /// Queue a packet, blocking while the channel is full. Fails once the worker is gone.
    pub fn send(&self, packet: PacketRecord) -> Result<()> {
        self.tx
            .send(packet)
            .map_err(|_| QosError::Worker("ingest channel closed".to_string()))
    }

    /// Decode one JSON packet document and queue it.
    pub fn send_json(&self, document: &str) -> Result<()> {
        self.send(PacketRecord::from_json(document)?)
    }
}

/// Owns the ingest worker thread.
pub struct PacketIngest {
    tx: Option<Sender<PacketRecord>>,
    /// Dropping this disconnects the worker's stop channel.
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<IngestReport>>,
}

impl PacketIngest {
    pub fn spawn(manager: Arc<QosManager>, capacity: usize) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let handle = std::thread::Builder::new()
            .name("QoS-Processor".to_string())
            .spawn(move || drain(&manager, &rx, &stop_rx))?;
        debug!(capacity, "packet ingest started");
        Ok(Self {
            tx: Some(tx),
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// A new producer handle. Fails after `shutdown` has started.
    pub fn sender(&self) -> Result<IngestSender> {
        self.tx
            .as_ref()
            .map(|tx| IngestSender { tx: tx.clone() })
            .ok_or_else(|| QosError::Worker("ingest already shut down".to_string()))
    }

    /// Stop the worker and wait for it.
    ///
    /// Packets already queued are still processed. Outstanding [`IngestSender`] clones
    /// do not hold the worker up; their later sends fail.
    pub fn shutdown(mut self) -> Result<IngestReport> {
        self.tx.take();
        self.stop.take();
        let handle = self
            .handle
            .take()
            .ok_or_else(|| QosError::Worker("ingest already shut down".to_string()))?;
        let report = handle
            .join()
            .map_err(|_| QosError::Worker("ingest worker panicked".to_string()))?;
        debug!(
            processed = report.processed,
            passed_through = report.passed_through,
            rejected = report.rejected,
            "packet ingest stopped"
        );
        Ok(report)
    }
}

impl Drop for PacketIngest {
    fn drop(&mut self) {
        self.tx.take();
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn drain(manager: &QosManager, rx: &Receiver<PacketRecord>, stop: &Receiver<()>) -> IngestReport {
    let mut report = IngestReport::default();
    loop {
        let running = crossbeam_channel::select! {
            recv(rx) -> packet => match packet {
                Ok(packet) => {
                    report.ingest(manager, &packet);
                    true
                }
                Err(_) => false,
            },
            recv(stop) -> _ => {
                // only the backlog present at stop time, producers may still be sending
                for _ in 0..rx.len() {
                    match rx.try_recv() {
                        Ok(packet) => report.ingest(manager, &packet),
                        Err(_) => break,
                    }
                }
                false
            }
        };
        if !running {
            break;
        }
    }
    if report.rejected > 0 {
        warn!(rejected = report.rejected, "ingest finished with rejected packets");
    }
    report
}
