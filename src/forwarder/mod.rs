//! Stream forwarder: owns the destination connection and drives the
//! per-record pipeline.
//!
//! A [`LogstashForwarder`] consumes a host-provided channel of log records
//! until the channel closes. Each record has its options resolved, is
//! enriched into an [`Envelope`](crate::Envelope), serialised to compact
//! JSON and written to the destination in a single transport send. A failed
//! write triggers exactly one reconnect-and-retry; failure past that point
//! is terminal and surfaces to the owning supervisor rather than tearing
//! down the process.

mod config;
mod handler;
mod identity;
mod worker;


use std::io;

use thiserror::Error;

pub use config::{DEFAULT_METADATA_TIMEOUT, DEFAULT_METADATA_URL, ForwarderConfig};
pub use handler::{DEFAULT_TRANSPORT, ForwarderHandle, LogstashForwarder};

/// Errors raised while constructing a forwarder.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The route names a transport kind the registry does not know.
    #[error("unable to find transport: {0}")]
    UnknownTransport(String),
    /// The initial dial of the destination failed.
    #[error("dial {address} failed: {source}")]
    Dial {
        /// Destination address that could not be dialled.
        address: String,
        /// Underlying I/O failure.
        source: io::Error,
    },
}

/// Terminal errors raised by a streaming forwarder.
///
/// Any of these ends the stream; records still queued on the inbound
/// channel are left unprocessed for the supervisor to deal with.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The route's transport kind vanished from the registry between
    /// construction and reconnection.
    #[error("unable to find transport: {0}")]
    UnknownTransport(String),
    /// Dialling a replacement connection failed.
    #[error("reconnect to {address} failed: {source}")]
    Reconnect {
        /// Destination address that could not be re-dialled.
        address: String,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The retried write failed on the freshly dialled connection.
    #[error("write failed after reconnect: {0}")]
    RetryFailed(io::Error),
    /// The spawned worker thread panicked.
    #[error("forwarder worker thread panicked")]
    Panicked,
}
