//! Static per-destination configuration.

use crate::options::OptionsMap;

/// Destination a forwarder ships to: an address, an optional transport kind
/// and transport-specific options. Immutable once the forwarder is built.
#[derive(Clone, Debug)]
pub struct Route {
    /// Destination address, typically `host:port`.
    pub address: String,
    /// Declared transport kind; the forwarder falls back to its default
    /// when absent or empty.
    pub transport: Option<String>,
    /// Transport-specific options, e.g. TLS settings.
    pub options: OptionsMap,
}

impl Route {
    /// Create a route to `address` with no declared transport or options.
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_owned(),
            transport: None,
            options: OptionsMap::new(),
        }
    }

    /// Declare the transport kind to dial with.
    #[must_use]
    pub fn with_transport(mut self, kind: &str) -> Self {
        self.transport = Some(kind.to_owned());
        self
    }

    /// Attach one transport option.
    #[must_use]
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_owned(), value.to_owned());
        self
    }

    /// The declared transport kind, or `default` when none was declared.
    pub fn transport_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.transport
            .as_deref()
            .filter(|kind| !kind.is_empty())
            .unwrap_or(default)
    }
}
