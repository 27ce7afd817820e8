use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;

use crate::buffer::SampleBuffer;
use crate::sample;
use crate::stream::{stop_requested, Worker, IDLE_SLEEP, SEND_TIMEOUT_MS};

/// Message-queue sink: binds a PUSH socket and drains the shared buffer into
/// one message per iteration. A send that times out is retried on the next
/// iteration; the drained records are never force-completed or discarded.
pub struct PushSink {
    _worker: Worker,
    _ctx: zmq::Context,
}

impl PushSink {
    /// Binds `tcp://host:port` and launches the transmit thread. The buffer
    /// is owned by the signal-processing side; the `Arc` keeps it alive for
    /// at least the endpoint's lifetime.
    pub fn new(host: &str, port: u16, buffer: Arc<SampleBuffer>) -> Result<Self> {
        let addr = format!("tcp://{}:{}", host, port);
        let ctx = zmq::Context::new();
        let socket = ctx
            .socket(zmq::PUSH)
            .context("failed to create push socket")?;
        socket
            .bind(&addr)
            .with_context(|| format!("failed to bind push socket on {}", addr))?;
        socket
            .set_sndtimeo(SEND_TIMEOUT_MS)
            .context("failed to set push socket send timeout")?;
        info!("push sink bound on {}", addr);

        let worker = Worker::spawn("push-sink", move |stop| run(socket, buffer, stop))?;
        Ok(Self {
            _worker: worker,
            _ctx: ctx,
        })
    }
}

fn run(socket: zmq::Socket, buffer: Arc<SampleBuffer>, stop: Receiver<()>) {
    // Message drained but not yet accepted by the socket.
    let mut pending: Option<Vec<u8>> = None;
    loop {
        if stop_requested(&stop) {
            break;
        }
        if pending.is_none() && !buffer.is_empty() {
            pending = Some(sample::encode_records(&buffer.drain_all()));
        }
        match pending.take() {
            Some(message) => match socket.send(&message[..], 0) {
                Ok(()) => {}
                Err(zmq::Error::EAGAIN) => {
                    debug!("push sink: send timed out, retrying");
                    pending = Some(message);
                }
                Err(e) => {
                    warn!("push sink: send failed: {}", e);
                    pending = Some(message);
                }
            },
            None => thread::sleep(IDLE_SLEEP),
        }
    }
    debug!("push sink stopped");
}
