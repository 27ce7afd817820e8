//! Transport endpoints. Every endpoint follows the same lifecycle: the
//! constructor resolves and opens its socket (failing synchronously, with no
//! half-started thread), then launches one background I/O thread; dropping
//! the endpoint signals that thread and joins it.

pub mod rx;
pub mod tx;

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

use crate::buffer::SampleBuffer;
use crate::config::{EndpointConfig, Role, Transport};
use self::rx::Source;

/// Voluntary yield when an endpoint loop finds no work queued.
pub(crate) const IDLE_SLEEP: Duration = Duration::from_micros(1);

/// Bound on a blocking send, in milliseconds.
pub(crate) const SEND_TIMEOUT_MS: i32 = 2000;

/// Queued-record count above which a source sheds newly completed records
/// instead of appending them.
pub const HIGH_WATER_MARK: usize = 1_000_000;

/// Largest datagram payload a UDP sink emits. Record-aligned (184 records of
/// 8 bytes) so every datagram carries only whole records.
pub const MAX_DATAGRAM_BYTES: usize = 1472;

/// True once the owner has signalled shutdown. A dropped channel counts as a
/// stop signal, so an endpoint thread can never outlive its handle.
pub(crate) fn stop_requested(stop: &Receiver<()>) -> bool {
    match stop.try_recv() {
        Ok(()) => true,
        Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

/// Resolve `host:port` at construction time, so bad addresses fail the
/// caller synchronously rather than surfacing inside the I/O loop.
pub(crate) fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve {}:{}", host, port))?
        .next()
        .ok_or_else(|| anyhow!("no address found for {}:{}", host, port))
}

/// Any endpoint, type-erased for owners that assemble their topology from
/// config files. Dropping it stops and joins the endpoint's I/O thread.
pub enum Endpoint {
    PullSource(rx::PullSource),
    UdpSource(rx::UdpSource),
    PushSink(tx::PushSink),
    TcpSink(tx::TcpSink),
    UdpSink(tx::UdpSink),
}

impl Endpoint {
    /// Opens the endpoint `config` describes. Sinks drain `buffer`; sources
    /// ignore it, create their own output buffer and expose it through
    /// [`Endpoint::buffer`].
    pub fn open(config: &EndpointConfig, buffer: Option<Arc<SampleBuffer>>) -> Result<Self> {
        match config.role {
            Role::Source => match config.transport {
                Transport::Pull => Ok(Endpoint::PullSource(rx::PullSource::new(
                    &config.host,
                    config.port,
                    config.capacity,
                )?)),
                Transport::Udp => Ok(Endpoint::UdpSource(rx::UdpSource::new(
                    &config.host,
                    config.port,
                    config.capacity,
                )?)),
                Transport::Push | Transport::Tcp => {
                    bail!("{:?} endpoints cannot be sources", config.transport)
                }
            },
            Role::Sink => {
                let buffer =
                    buffer.ok_or_else(|| anyhow!("sink endpoints need a buffer to drain"))?;
                match config.transport {
                    Transport::Push => Ok(Endpoint::PushSink(tx::PushSink::new(
                        &config.host,
                        config.port,
                        buffer,
                    )?)),
                    Transport::Tcp => Ok(Endpoint::TcpSink(tx::TcpSink::new(
                        &config.host,
                        config.port,
                        buffer,
                    )?)),
                    Transport::Udp => Ok(Endpoint::UdpSink(tx::UdpSink::new(
                        &config.host,
                        config.port,
                        buffer,
                    )?)),
                    Transport::Pull => bail!("pull endpoints cannot be sinks"),
                }
            }
        }
    }

    /// The output buffer of a source endpoint; `None` for sinks.
    pub fn buffer(&self) -> Option<Arc<SampleBuffer>> {
        match self {
            Endpoint::PullSource(source) => Some(source.buffer()),
            Endpoint::UdpSource(source) => Some(source.buffer()),
            _ => None,
        }
    }
}

/// An endpoint's background thread plus its stop channel. Dropping a Worker
/// signals the thread and blocks until it has exited, which is when the
/// thread-owned socket is closed.
pub(crate) struct Worker {
    stop: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn<F>(name: &str, entry: F) -> Result<Worker>
    where
        F: FnOnce(Receiver<()>) + Send + 'static,
    {
        let (stop, stop_rx) = channel::unbounded();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || entry(stop_rx))
            .with_context(|| format!("failed to spawn {} thread", name))?;
        Ok(Worker {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("endpoint thread panicked during shutdown");
            }
        }
    }
}
