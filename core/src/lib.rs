//! Sample transport core for distributed SDR nodes.
//!
//! Moves fixed-size IQ sample records between network sockets and a shared
//! [`SampleBuffer`]. Each endpoint owns one socket and one background thread:
//! sources (`stream::rx`) fill a buffer from the network, sinks (`stream::tx`)
//! drain one onto the network. Dropping an endpoint signals its thread and
//! joins it before returning.
#[macro_use]
extern crate log;

pub mod buffer;
pub mod config;
pub mod reassembly;
pub mod sample;
pub mod stream;

pub use buffer::SampleBuffer;
pub use config::EndpointConfig;
pub use stream::Endpoint;
pub use reassembly::Reassembler;
pub use sample::{IqSample, IQ_SIZE};
