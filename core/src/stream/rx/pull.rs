use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;

use super::Source;
use crate::buffer::SampleBuffer;
use crate::sample;
use crate::stream::{stop_requested, Worker, IDLE_SLEEP};

/// Message-queue source: connects a PULL socket to a remote PUSH peer and
/// appends every record-aligned message to its output buffer. Messages whose
/// length is not a whole number of records are reported and discarded.
pub struct PullSource {
    buffer: Arc<SampleBuffer>,
    _worker: Worker,
    _ctx: zmq::Context,
}

impl PullSource {
    /// Connects to `tcp://host:port` and launches the receive thread. The
    /// output buffer is created here with the given initial capacity and
    /// owned by the source.
    pub fn new(host: &str, port: u16, capacity: usize) -> Result<Self> {
        let addr = format!("tcp://{}:{}", host, port);
        let ctx = zmq::Context::new();
        let socket = ctx
            .socket(zmq::PULL)
            .context("failed to create pull socket")?;
        socket
            .connect(&addr)
            .with_context(|| format!("failed to connect pull socket to {}", addr))?;
        info!("pull source connected to {}", addr);

        let buffer = Arc::new(SampleBuffer::with_capacity(capacity));
        let out = buffer.clone();
        let worker = Worker::spawn("pull-source", move |stop| run(socket, out, stop))?;
        Ok(Self {
            buffer,
            _worker: worker,
            _ctx: ctx,
        })
    }
}

impl Source for PullSource {
    fn buffer(&self) -> Arc<SampleBuffer> {
        self.buffer.clone()
    }
}

fn run(socket: zmq::Socket, buffer: Arc<SampleBuffer>, stop: Receiver<()>) {
    loop {
        if stop_requested(&stop) {
            break;
        }
        match socket.recv_bytes(zmq::DONTWAIT) {
            Ok(message) => match sample::decode_records(&message) {
                Ok(records) => buffer.append(&records),
                Err(e) => warn!("pull source: discarding message: {}", e),
            },
            Err(zmq::Error::EAGAIN) => thread::sleep(IDLE_SLEEP),
            Err(e) => warn!("pull source: recv failed: {}", e),
        }
    }
    debug!("pull source stopped");
}
