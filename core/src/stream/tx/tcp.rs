use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;

use crate::buffer::SampleBuffer;
use crate::sample;
use crate::stream::{resolve, stop_requested, Worker, IDLE_SLEEP, SEND_TIMEOUT_MS};

/// Stream sink: connects to a remote peer and writes drained records as a
/// contiguous byte stream. The drain happens under the buffer's lock; the
/// write happens outside it.
pub struct TcpSink {
    _worker: Worker,
}

impl TcpSink {
    /// Connects to `host:port` and launches the transmit thread. The buffer
    /// is owned by the signal-processing side.
    pub fn new(host: &str, port: u16, buffer: Arc<SampleBuffer>) -> Result<Self> {
        let addr = resolve(host, port)?;
        let stream = TcpStream::connect(addr)
            .with_context(|| format!("failed to connect tcp sink to {}", addr))?;
        stream
            .set_write_timeout(Some(Duration::from_millis(SEND_TIMEOUT_MS as u64)))
            .context("failed to set tcp sink write timeout")?;
        info!("tcp sink connected to {}", addr);

        let worker = Worker::spawn("tcp-sink", move |stop| run(stream, buffer, stop))?;
        Ok(Self { _worker: worker })
    }
}

fn run(mut stream: TcpStream, buffer: Arc<SampleBuffer>, stop: Receiver<()>) {
    // Bytes drained but not yet written to the socket.
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
            pending = sample::encode_records(&buffer.drain_all());
        }
        match stream.write(&pending) {
            Ok(n) => {
                pending.drain(..n);
            }
            Err(e) => {
                // Unsent bytes stay pending; retried on the next iteration.
                warn!("tcp sink: write failed: {}", e);
            }
        }
    }
    debug!("tcp sink stopped");
}
