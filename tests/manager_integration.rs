// End-to-end checks of the QoS manager through the public API

use qos_sim::manager::{QosConfig, QosManager, QosMode};
use qos_sim::scheduler::{LearningConfig, RoundRobinConfig, StrategyMode};
use qos_sim::{Comparison, PacketRecord, TrafficLoad, TrafficType, UserDensity};

fn packet(stream_id: &str, traffic_type: TrafficType, timestamp: f64) -> PacketRecord {
    PacketRecord {
        stream_id: stream_id.to_string(),
        user_id: 1,
        data_rate: 10.0,
        latency: 20.0,
        packet_loss: 2.0,
        traffic_type,
        traffic_load: TrafficLoad::Light,
        cqi: 1.0,
        timestamp,
    }
}

fn config(mode: QosMode, seed: u64) -> QosConfig {
    QosConfig {
        mode,
        learning: LearningConfig {
            seed: Some(seed),
            ..LearningConfig::default()
        },
        ..QosConfig::default()
    }
}

#[test]
fn round_robin_serves_each_stream_for_one_slice() {
    let qos = QosManager::new(QosConfig {
        round_robin: RoundRobinConfig { time_slice: 2 },
        ..config(QosMode::Rr, 1)
    })
    .unwrap();
    for id in ["a", "b", "c"] {
        qos.register_stream(id, TrafficType::TextMessage, UserDensity::Low);
    }

    // rotation order is a,a,b,b,c,c so every one of these is served
    for (i, id) in ["a", "a", "b", "b", "c", "c"].iter().enumerate() {
        let (out, _) = qos
            .process(id, &packet(id, TrafficType::TextMessage, i as f64))
            .unwrap();
        assert!((out.data_rate - 15.0).abs() < 1e-12, "{id} at {i} should be served");
        assert!((out.latency - 16.0).abs() < 1e-12);
    }

    // the slice now belongs to `a`
    let (out, _) = qos
        .process("b", &packet("b", TrafficType::TextMessage, 6.0))
        .unwrap();
    assert!((out.data_rate - 8.0).abs() < 1e-12);
    assert!((out.latency - 24.0).abs() < 1e-12);
}

#[test]
fn removed_stream_leaves_rotation_and_passes_through() {
    let qos = QosManager::new(config(QosMode::Rr, 1)).unwrap();
    qos.register_stream("a", TrafficType::VoiceCall, UserDensity::High);
    qos.register_stream("b", TrafficType::VoiceCall, UserDensity::High);
    assert!(qos.remove_stream("a"));

    let original = packet("a", TrafficType::VoiceCall, 0.0);
    let (out, metrics) = qos.process("a", &original).unwrap();
    assert_eq!(out, original);
    assert!(metrics.is_none());
    assert!(!qos.in_rotation("a"));
    assert!(qos.in_rotation("b"));
}

#[test]
fn compare_mode_measures_against_round_robin() {
    let qos = QosManager::new(config(QosMode::Compare, 5)).unwrap();
    qos.register_stream("s1", TrafficType::TextMessage, UserDensity::Medium);
    for i in 0..20 {
        qos.process("s1", &packet("s1", TrafficType::TextMessage, i as f64))
            .unwrap();
    }

    let Comparison::Overall(overall) = qos.get_comparison(None) else {
        panic!("expected the overall comparison");
    };
    assert_eq!(overall.breakdown.modes.len(), 3);
    assert!(!overall.breakdown.improvements.contains_key(&StrategyMode::RoundRobin));
    assert_eq!(overall.performance_summary.total_packets_processed, 60);
    assert_eq!(overall.performance_summary.active_streams, 1);

    // single stream: round robin always serves it, CQI at 1.0 leaves packets untouched
    let cqi = overall.breakdown.improvements[&StrategyMode::ChannelQuality];
    assert!((cqi.avg_throughput - (10.0 - 15.0) / 15.0 * 100.0).abs() < 1e-9);
    assert!((cqi.avg_latency - (16.0 - 20.0) / 16.0 * 100.0).abs() < 1e-9);
    assert!((cqi.avg_packet_loss - (1.6 - 2.0) / 1.6 * 100.0).abs() < 1e-9);
    assert_eq!(cqi.avg_jitter, 0.0);
    let expected_overall =
        (cqi.avg_throughput - cqi.avg_latency - cqi.avg_packet_loss - cqi.avg_jitter) / 4.0;
    assert!((cqi.overall - expected_overall).abs() < 1e-9);

    let text = &overall.by_traffic_type[&TrafficType::TextMessage];
    assert_eq!(text.modes.len(), 3);
}

#[test]
fn compare_mode_advances_rotation_once_per_packet() {
    let qos = QosManager::new(QosConfig {
        round_robin: RoundRobinConfig { time_slice: 1 },
        ..config(QosMode::Compare, 2)
    })
    .unwrap();
    qos.register_stream("a", TrafficType::TextMessage, UserDensity::Low);
    qos.register_stream("b", TrafficType::TextMessage, UserDensity::Low);

    // one step per packet keeps the rotation in lockstep with a,b,a,b
    for (i, id) in ["a", "b", "a", "b"].iter().enumerate() {
        qos.process(id, &packet(id, TrafficType::TextMessage, i as f64))
            .unwrap();
    }

    let rr = qos.strategy_statistics()[&StrategyMode::RoundRobin].statistics;
    assert_eq!(rr.count, 4);
    assert!((rr.throughput - 15.0).abs() < 1e-12);
}

#[test]
fn removed_stream_keeps_its_comparison_history() {
    let qos = QosManager::new(config(QosMode::Compare, 4)).unwrap();
    qos.register_stream("gone", TrafficType::YouTube, UserDensity::Low);
    for i in 0..3 {
        qos.process("gone", &packet("gone", TrafficType::YouTube, i as f64))
            .unwrap();
    }
    assert!(qos.remove_stream("gone"));

    assert_eq!(qos.get_metrics("gone"), None);
    let Comparison::Stream(stream) = qos.get_comparison(Some("gone")) else {
        panic!("expected a stream comparison");
    };
    assert_eq!(stream.modes.len(), 3);
    assert_eq!(stream.modes[&StrategyMode::RoundRobin].performance_stats.total_packets, 3);
}

#[test]
fn metrics_follow_the_returned_packets() {
    let qos = QosManager::new(config(QosMode::Rl, 9)).unwrap();
    qos.register_stream("s1", TrafficType::YouTube, UserDensity::Low);
    let mut latencies = Vec::new();
    for i in 0..10 {
        let (out, _) = qos
            .process("s1", &packet("s1", TrafficType::YouTube, i as f64))
            .unwrap();
        latencies.push(out.latency);
    }
    let metrics = qos.get_metrics("s1").unwrap();
    assert_eq!(metrics.packet_count, 10);
    let mean = latencies.iter().sum::<f64>() / latencies.len() as f64;
    assert!((metrics.avg_latency - mean).abs() < 1e-9);
    let jitter: f64 = latencies
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .sum::<f64>()
        / 9.0;
    assert!((metrics.avg_jitter - jitter).abs() < 1e-9);
}

#[test]
fn same_seed_same_decisions() {
    let run = || {
        let qos = QosManager::new(config(QosMode::Rl, 42)).unwrap();
        qos.register_stream("s1", TrafficType::VideoCall, UserDensity::High);
        qos.register_stream("s2", TrafficType::WhatsApp, UserDensity::Low);
        let mut outputs = Vec::new();
        for i in 0..200 {
            let id = if i % 3 == 0 { "s2" } else { "s1" };
            let traffic_type = if id == "s1" {
                TrafficType::VideoCall
            } else {
                TrafficType::WhatsApp
            };
            let mut p = packet(id, traffic_type, i as f64);
            p.latency = (i % 90) as f64;
            outputs.push(qos.process(id, &p).unwrap().0);
        }
        (outputs, qos.value_table(), qos.epsilon())
    };
    assert_eq!(run(), run());
}

#[test]
fn mode_switch_changes_strategy_used() {
    let qos = QosManager::new(config(QosMode::Rl, 3)).unwrap();
    qos.register_stream("s1", TrafficType::Instagram, UserDensity::Medium);
    qos.process("s1", &packet("s1", TrafficType::Instagram, 0.0))
        .unwrap();
    assert_eq!(qos.switch_mode(), "RR");
    qos.process("s1", &packet("s1", TrafficType::Instagram, 1.0))
        .unwrap();

    let stats = qos.strategy_statistics();
    assert_eq!(stats[&StrategyMode::Adaptive].statistics.count, 1);
    assert_eq!(stats[&StrategyMode::RoundRobin].statistics.count, 1);
    assert_eq!(stats[&StrategyMode::ChannelQuality].statistics.count, 0);
    assert_eq!(qos.mode(), QosMode::Rr);
}

#[test]
fn snapshot_exports_every_section() {
    let qos = QosManager::new(config(QosMode::Compare, 8)).unwrap();
    qos.register_stream("s1", TrafficType::VoiceMessage, UserDensity::Low);
    qos.register_stream("s2", TrafficType::VideoCall, UserDensity::High);
    for i in 0..5 {
        qos.process("s1", &packet("s1", TrafficType::VoiceMessage, i as f64))
            .unwrap();
        qos.process("s2", &packet("s2", TrafficType::VideoCall, i as f64))
            .unwrap();
    }

    let json = serde_json::to_value(qos.export_snapshot()).unwrap();
    assert_eq!(json["mode"], "COMPARE");
    assert!(json["generated_at"].as_f64().unwrap() > 0.0);
    assert!(json["overall_comparison"]["modes"]["RL"].is_object());
    assert!(json["stream_metrics"]["s1"]["modes"]["CQI"].is_object());
    assert!(json["traffic_type_analysis"]["Video Call"].is_object());
    assert_eq!(json["comparison_history"].as_array().unwrap().len(), 30);
    assert_eq!(json["strategies"]["RR"]["statistics"]["count"], 10);
    assert_eq!(json["live_metrics"]["s2"]["packet_count"], 5);
}
