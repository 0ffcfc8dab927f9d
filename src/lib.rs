//! Forwarding core for shipping container log records to Logstash.
//!
//! The crate consumes a host-fed channel of [`LogRecord`] values and ships
//! each one to a single destination as a flat JSON [`Envelope`], one
//! transport send per record. Per-record option mappings are merged over
//! process-wide defaults ([`options`]), the destination is dialled through
//! an explicit [`TransportRegistry`] ([`transport`]), and a failed write is
//! retried exactly once over a fresh connection before the stream reports a
//! terminal error to its supervisor ([`forwarder`]).

mod envelope;
pub mod forwarder;
pub mod options;
mod record;
mod route;
pub mod transport;

pub use envelope::Envelope;
pub use forwarder::{
    BuildError, DEFAULT_TRANSPORT, ForwardError, ForwarderConfig, ForwarderHandle,
    LogstashForwarder,
};
pub use options::OptionsMap;
pub use record::{ContainerInfo, LogRecord};
pub use route::Route;
pub use transport::{
    Connection, TcpTransport, TlsTransport, Transport, TransportRegistry, UdpTransport,
};
