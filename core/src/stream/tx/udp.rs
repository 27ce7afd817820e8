use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;

use crate::buffer::SampleBuffer;
use crate::sample;
use crate::stream::{resolve, stop_requested, Worker, IDLE_SLEEP, MAX_DATAGRAM_BYTES};

/// Upper bound on how many records one iteration drains from the buffer.
const MAX_CHUNK_RECORDS: usize = 4096;

/// Datagram sink: drains a bounded chunk of records per iteration and sends
/// it as one or more capped-size datagrams, looping until the chunk is out.
pub struct UdpSink {
    _worker: Worker,
}

impl UdpSink {
    /// Resolves the destination, binds an ephemeral local socket and
    /// launches the transmit thread. The buffer is owned by the
    /// signal-processing side.
    pub fn new(host: &str, port: u16, buffer: Arc<SampleBuffer>) -> Result<Self> {
        let dest = resolve(host, port)?;
        let socket =
            UdpSocket::bind("0.0.0.0:0").context("failed to bind udp sink socket")?;
        info!("udp sink sending to {}", dest);

        let worker = Worker::spawn("udp-sink", move |stop| run(socket, dest, buffer, stop))?;
        Ok(Self { _worker: worker })
    }
}

fn run(socket: UdpSocket, dest: SocketAddr, buffer: Arc<SampleBuffer>, stop: Receiver<()>) {
    // Encoded bytes drained but not yet sent.
    let mut pending: Vec<u8> = Vec::new();
    loop {
        if stop_requested(&stop) {
            break;
        }
        if pending.is_empty() {
            if buffer.is_empty() {
                thread::sleep(IDLE_SLEEP);
                continue;
            }
            pending = sample::encode_records(&buffer.drain(MAX_CHUNK_RECORDS));
        }
        while !pending.is_empty() {
            let n = pending.len().min(MAX_DATAGRAM_BYTES);
            match socket.send_to(&pending[..n], dest) {
                Ok(sent) => {
                    pending.drain(..sent);
                }
                Err(e) => {
                    // Unsent tail stays pending; retried on the next
                    // iteration after the stop check.
                    warn!("udp sink: send failed: {}", e);
                    break;
                }
            }
        }
    }
    debug!("udp sink stopped");
}
