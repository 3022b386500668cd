// Simulator binary: replays JSON-lines packets from stdin through the QoS manager
//
// Each line is one packet document, optionally carrying a `user_density` for its stream.
// Streams are registered on first sight. When stdin closes the final snapshot is printed
// to stdout as JSON; logs go to stderr.

use qos_sim::ingest::DEFAULT_INGEST_CAPACITY;
use qos_sim::{
    IngestReport, PacketIngest, PacketRecord, QosConfig, QosManager, QosMode, QosSnapshot,
    UserDensity,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line options parsed from program arguments.
struct CliOptions {
    /// JSON configuration file; defaults apply when absent
    config: Option<String>,
    /// Overrides the configured initial mode
    mode: Option<QosMode>,
    /// Overrides the configured learner seed
    seed: Option<u64>,
    /// Density assigned to streams whose packets do not name one
    density: UserDensity,
}

/// One stdin line.
#[derive(Debug, Deserialize)]
struct InputLine {
    #[serde(flatten)]
    packet: PacketRecord,
    #[serde(default)]
    user_density: Option<UserDensity>,
}

#[derive(Serialize)]
struct RunSummary {
    ingest: IngestReport,
    undecodable_lines: u64,
    snapshot: QosSnapshot,
}

/// Decode one raw stdin line. `Ok(None)` for blank lines; undecodable lines (bad UTF-8
/// or bad JSON) come back as the reason to report.
fn decode_line(raw: &[u8]) -> Result<Option<InputLine>, String> {
    let text = std::str::from_utf8(raw).map_err(|err| err.to_string())?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some).map_err(|err| err.to_string())
}

fn parse_density(value: &str) -> Result<UserDensity, String> {
    match value.to_ascii_lowercase().as_str() {
        "low" => Ok(UserDensity::Low),
        "medium" => Ok(UserDensity::Medium),
        "high" => Ok(UserDensity::High),
        other => Err(format!("unknown density `{other}`")),
    }
}

/// Parse command-line arguments into `CliOptions`.
///
/// Accepts `--flag=value` and `--flag value` for `--config`, `--mode`, `--seed` and
/// `--density`.
fn parse_cli_options() -> Result<CliOptions, Box<dyn std::error::Error>> {
    let mut options = CliOptions {
        config: None,
        mode: None,
        seed: None,
        density: UserDensity::Medium,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let (key, value) = match arg.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for `{arg}`"))?;
                (arg, value)
            }
        };
        match key.as_str() {
            "--config" => options.config = Some(value),
            "--mode" => options.mode = Some(value.parse()?),
            "--seed" => options.seed = Some(value.parse()?),
            "--density" => options.density = parse_density(&value)?,
            other => return Err(format!("unknown argument `{other}`").into()),
        }
    }
    Ok(options)
}

fn load_config(options: &CliOptions) -> Result<QosConfig, Box<dyn std::error::Error>> {
    let mut config = match &options.config {
        Some(path) => QosConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => QosConfig::default(),
    };
    if let Some(mode) = options.mode {
        config.mode = mode;
    }
    if let Some(seed) = options.seed {
        config.learning.seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let options = parse_cli_options()?;
    let config = load_config(&options)?;
    info!(mode = %config.mode, seed = ?config.learning.seed, "starting QoS simulator");

    let manager = Arc::new(QosManager::new(config)?);
    let ingest = PacketIngest::spawn(Arc::clone(&manager), DEFAULT_INGEST_CAPACITY)?;
    let sender = ingest.sender()?;

    let mut known = HashSet::new();
    let mut undecodable_lines = 0u64;
    let mut stdin = io::stdin().lock();
    let mut raw = Vec::new();
    let mut number = 0usize;
    loop {
        raw.clear();
        if stdin.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        number += 1;
        let input = match decode_line(&raw) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(reason) => {
                warn!(line = number, error = %reason, "skipping undecodable line");
                undecodable_lines += 1;
                continue;
            }
        };
        if known.insert(input.packet.stream_id.clone()) {
            manager.register_stream(
                &input.packet.stream_id,
                input.packet.traffic_type,
                input.user_density.unwrap_or(options.density),
            );
        }
        sender.send(input.packet)?;
    }
    drop(sender);

    let ingest_report = ingest.shutdown()?;
    info!(
        processed = ingest_report.processed,
        rejected = ingest_report.rejected,
        undecodable_lines,
        "input exhausted"
    );

    let summary = RunSummary {
        ingest: ingest_report,
        undecodable_lines,
        snapshot: manager.export_snapshot(),
    };
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &str = r#"{"stream_id":"s1","user_id":1,"data_rate":5.0,"latency":10.0,"packet_loss":0.5,"traffic_type":"Voice Call","traffic_load":"light","cqi":0.9,"timestamp":1.0}"#;

    #[test]
    fn decodes_packet_with_optional_density() {
        let input = decode_line(PACKET.as_bytes()).unwrap().unwrap();
        assert_eq!(input.packet.stream_id, "s1");
        assert_eq!(input.user_density, None);

        let with_density = PACKET.replacen('{', r#"{"user_density":"high","#, 1);
        let input = decode_line(format!("{with_density}\r\n").as_bytes()).unwrap().unwrap();
        assert_eq!(input.user_density, Some(UserDensity::High));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(decode_line(b"   \n").unwrap().is_none());
    }

    #[test]
    fn invalid_utf8_is_undecodable_like_bad_json() {
        assert!(decode_line(b"garbage \xff\xfe line\n").is_err());
        assert!(decode_line(b"not json\n").is_err());
    }
}
