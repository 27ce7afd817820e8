use std::sync::Arc;

use crate::buffer::SampleBuffer;

pub mod pull;
pub mod udp;

pub use pull::PullSource;
pub use udp::UdpSource;

/// A source owns its output buffer and fills it from the network. The
/// signal-processing side takes a shared handle and drains it.
pub trait Source {
    fn buffer(&self) -> Arc<SampleBuffer>;
}
