//! Instance identity resolution against the local metadata service.

use std::time::Duration;

use log::debug;
use ureq::AgentBuilder;

/// Fetch the instance identity from `url`.
///
/// Resolved once per stream and never retried: an unreachable endpoint, an
/// error status or an unreadable body all degrade to an empty identity,
/// which the enricher omits from envelopes. The response body is consumed
/// on every path so the connection is released cleanly.
pub(crate) fn fetch_instance_id(url: &str, timeout: Duration) -> String {
    let agent = AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout(timeout)
        .build();
    match agent.get(url).call() {
        Ok(response) => match response.into_string() {
            Ok(body) => body,
            Err(err) => {
                debug!("LogstashForwarder could not read instance identity: {err}");
                String::new()
            }
        },
        Err(err) => {
            debug!("LogstashForwarder instance identity unavailable: {err}");
            String::new()
        }
    }
}
