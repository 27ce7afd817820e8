use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;

use super::Source;
use crate::buffer::SampleBuffer;
use crate::reassembly::Reassembler;
use crate::stream::{resolve, stop_requested, Worker, HIGH_WATER_MARK};

/// Receive scratch space; larger than any single datagram.
const RECV_BUFFER_SIZE: usize = 65536;

/// How long the event loop waits in the receive before rechecking the stop
/// signal.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Datagram source: binds a UDP socket and runs an event loop on its own
/// thread. Datagram boundaries carry no meaning here; received bytes go
/// through a [`Reassembler`] and only whole records reach the buffer.
///
/// Once the buffer is over [`HIGH_WATER_MARK`] records, newly completed
/// records are shed with a warning instead of appended. Backpressure policy,
/// not a fatal condition.
pub struct UdpSource {
    buffer: Arc<SampleBuffer>,
    _worker: Worker,
}

impl UdpSource {
    /// Binds `host:port` and launches the event-loop thread. The output
    /// buffer is created here with the given initial capacity and owned by
    /// the source.
    pub fn new(host: &str, port: u16, capacity: usize) -> Result<Self> {
        let addr = resolve(host, port)?;
        let socket = UdpSocket::bind(addr)
            .with_context(|| format!("failed to bind udp source on {}", addr))?;
        socket
            .set_nonblocking(true)
            .context("failed to set udp source socket non-blocking")?;
        info!("udp source listening on {}", addr);

        let buffer = Arc::new(SampleBuffer::with_capacity(capacity));
        let out = buffer.clone();
        let worker = Worker::spawn("udp-source", move |stop| run(socket, out, stop))?;
        Ok(Self {
            buffer,
            _worker: worker,
        })
    }
}

impl Source for UdpSource {
    fn buffer(&self) -> Arc<SampleBuffer> {
        self.buffer.clone()
    }
}

fn run(socket: UdpSocket, buffer: Arc<SampleBuffer>, stop: Receiver<()>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("udp source: failed to build event loop: {}", e);
            return;
        }
    };
    runtime.block_on(async {
        let socket = match tokio::net::UdpSocket::from_std(socket) {
            Ok(socket) => socket,
            Err(e) => {
                error!("udp source: failed to register socket: {}", e);
                return;
            }
        };
        let mut scratch = [0u8; RECV_BUFFER_SIZE];
        let mut reassembler = Reassembler::new();
        loop {
            if stop_requested(&stop) {
                break;
            }
            match tokio::time::timeout(STOP_POLL, socket.recv_from(&mut scratch)).await {
                Ok(Ok((n, _peer))) => {
                    let records = reassembler.feed(&scratch[..n]);
                    if !records.is_empty()
                        && !buffer.append_bounded(&records, HIGH_WATER_MARK)
                    {
                        warn!(
                            "udp source: buffer over {} records, shedding {}",
                            HIGH_WATER_MARK,
                            records.len()
                        );
                    }
                }
                Ok(Err(e)) => warn!("udp source: recv failed: {}", e),
                // Receive wait elapsed; loop around to recheck the stop flag.
                Err(_) => {}
            }
        }
    });
    debug!("udp source stopped");
}
