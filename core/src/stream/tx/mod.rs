pub mod push;
pub mod tcp;
pub mod udp;

pub use push::PushSink;
pub use tcp::TcpSink;
pub use udp::UdpSink;
