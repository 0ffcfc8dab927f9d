//! Inbound log record representation.
//!
//! This module defines the `LogRecord` struct handed to a forwarder by the
//! host's collection layer: one observed line of container output together
//! with the metadata of the container that produced it.

/// Metadata describing the container a record originated from.
#[derive(Clone, Debug, Default)]
pub struct ContainerInfo {
    /// Container name as reported by the runtime.
    pub name: String,
    /// Container identifier.
    pub id: String,
    /// Image reference the container was started from.
    pub image: String,
    /// Hostname configured inside the container.
    pub hostname: String,
    /// Arguments the container entrypoint was invoked with.
    pub args: Vec<String>,
    /// Environment entries of the container, each in `KEY=VALUE` form.
    pub env: Vec<String>,
}

/// One observed line of container output plus its source metadata.
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Raw text payload of the observed line.
    pub data: String,
    /// Metadata of the container that produced the line.
    pub container: ContainerInfo,
}

impl LogRecord {
    /// Construct a record from its raw payload and source metadata.
    pub fn new(data: &str, container: ContainerInfo) -> Self {
        Self {
            data: data.to_owned(),
            container,
        }
    }
}
