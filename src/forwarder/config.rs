//! Forwarder configuration.

use std::time::Duration;

/// Well-known local endpoint answering with the instance identifier.
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/instance-id";

/// Default connect and read timeout for the one-shot metadata request.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunable settings for a forwarder.
#[derive(Clone, Debug)]
pub struct ForwarderConfig {
    /// URL queried once at stream start for the instance identity.
    pub metadata_url: String,
    /// Connect and read timeout applied to the metadata request.
    pub metadata_timeout: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            metadata_url: DEFAULT_METADATA_URL.to_owned(),
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }
}

impl ForwarderConfig {
    /// Override the metadata endpoint URL.
    #[must_use]
    pub fn with_metadata_url(mut self, url: &str) -> Self {
        self.metadata_url = url.to_owned();
        self
    }

    /// Override the metadata request timeout.
    #[must_use]
    pub fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }
}
