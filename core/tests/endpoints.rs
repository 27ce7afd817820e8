//! Socket loopback tests for the transport endpoints. Every test binds to
//! 127.0.0.1 on a freshly picked free port.

use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};

use iqstream_core::sample::{decode_records, IqSample, IQ_SIZE};
use iqstream_core::stream::rx::{PullSource, Source, UdpSource};
use iqstream_core::stream::tx::{PushSink, TcpSink, UdpSink};
use iqstream_core::SampleBuffer;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn free_port() -> u16 {
    portpicker::pick_unused_port().expect("no free port available")
}

fn records(n: usize) -> Vec<IqSample> {
    (0..n)
        .map(|k| IqSample::new(k as f32 * 0.5, -(k as f32)))
        .collect()
}

/// Polls `condition` until it holds or the deadline passes.
fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn udp_sink_to_udp_source_delivers_in_order() {
    init_logging();
    let port = free_port();
    let source = UdpSource::new("127.0.0.1", port, 1024).unwrap();

    let outgoing = Arc::new(SampleBuffer::new());
    let sent = records(500);
    outgoing.append(&sent);
    let _sink = UdpSink::new("127.0.0.1", port, outgoing.clone()).unwrap();

    let received = source.buffer();
    wait_for("udp delivery", || received.size() >= sent.len());
    assert_eq!(received.drain(sent.len()), sent);
    assert!(outgoing.is_empty());
}

#[test]
fn push_sink_to_pull_source_delivers_in_order() {
    init_logging();
    let port = free_port();
    let source = PullSource::new("127.0.0.1", port, 1024).unwrap();

    let outgoing = Arc::new(SampleBuffer::new());
    let sent = records(200);
    outgoing.append(&sent);
    let _sink = PushSink::new("127.0.0.1", port, outgoing.clone()).unwrap();

    let received = source.buffer();
    wait_for("push/pull delivery", || received.size() >= sent.len());
    assert_eq!(received.drain(sent.len()), sent);
}

#[test]
fn tcp_sink_writes_contiguous_record_stream() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let outgoing = Arc::new(SampleBuffer::new());
    let sent = records(300);
    outgoing.append(&sent);
    let _sink = TcpSink::new("127.0.0.1", port, outgoing.clone()).unwrap();

    let (mut peer, _) = listener.accept().unwrap();
    peer.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut payload = vec![0u8; sent.len() * IQ_SIZE];
    peer.read_exact(&mut payload).unwrap();
    assert_eq!(decode_records(&payload).unwrap(), sent);
}

#[test]
fn pull_source_discards_misaligned_message() {
    init_logging();
    let port = free_port();
    let source = PullSource::new("127.0.0.1", port, 1024).unwrap();

    let ctx = zmq::Context::new();
    let push = ctx.socket(zmq::PUSH).unwrap();
    push.bind(&format!("tcp://127.0.0.1:{}", port)).unwrap();

    // One byte too long: discarded whole, never partially interpreted.
    push.send(&vec![0u8; IQ_SIZE + 1][..], 0).unwrap();
    // An aligned follow-up proves the receive loop kept running.
    let sent = records(2);
    push.send(&iqstream_core::sample::encode_records(&sent)[..], 0)
        .unwrap();

    let received = source.buffer();
    wait_for("aligned message", || received.size() >= sent.len());
    assert_eq!(received.size(), sent.len());
    assert_eq!(received.drain_all(), sent);
}

#[test]
fn endpoints_shut_down_cleanly_without_traffic() {
    init_logging();

    let udp_port = free_port();
    drop(UdpSource::new("127.0.0.1", udp_port, 16).unwrap());
    // The port is released once the source is dropped.
    drop(UdpSource::new("127.0.0.1", udp_port, 16).unwrap());

    let buffer = Arc::new(SampleBuffer::new());
    drop(UdpSink::new("127.0.0.1", free_port(), buffer.clone()).unwrap());
    drop(PullSource::new("127.0.0.1", free_port(), 16).unwrap());
    drop(PushSink::new("127.0.0.1", free_port(), buffer.clone()).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(TcpSink::new("127.0.0.1", port, buffer).unwrap());
}

#[test]
fn config_driven_udp_pipeline() {
    init_logging();
    let port = free_port();

    let source_cfg = iqstream_core::EndpointConfig::from_yaml(&format!(
        "transport: udp\nrole: source\nhost: 127.0.0.1\nport: {}\n",
        port
    ))
    .unwrap();
    let source = iqstream_core::Endpoint::open(&source_cfg, None).unwrap();
    let received = source.buffer().expect("sources expose their buffer");

    let sink_cfg = iqstream_core::EndpointConfig::from_yaml(&format!(
        "transport: udp\nrole: sink\nhost: 127.0.0.1\nport: {}\n",
        port
    ))
    .unwrap();
    let outgoing = Arc::new(SampleBuffer::new());
    let sent = records(64);
    outgoing.append(&sent);
    let sink = iqstream_core::Endpoint::open(&sink_cfg, Some(outgoing)).unwrap();
    assert!(sink.buffer().is_none());

    wait_for("config-driven delivery", || received.size() >= sent.len());
    assert_eq!(received.drain_all(), sent);
}

#[test]
fn sink_config_without_buffer_is_rejected() {
    let cfg = iqstream_core::EndpointConfig::from_yaml(
        "transport: udp\nrole: sink\nhost: 127.0.0.1\nport: 5000\n",
    )
    .unwrap();
    assert!(iqstream_core::Endpoint::open(&cfg, None).is_err());
}

#[test]
fn construction_fails_synchronously_on_bad_address() {
    init_logging();
    assert!(UdpSource::new("no.such.host.invalid.", 5000, 16).is_err());
    let buffer = Arc::new(SampleBuffer::new());
    assert!(UdpSink::new("no.such.host.invalid.", 5000, buffer.clone()).is_err());
    assert!(TcpSink::new("no.such.host.invalid.", 5000, buffer).is_err());
}
