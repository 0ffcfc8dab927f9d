//! Forwarder construction, streaming entry points and the supervision
//! handle.

use std::{env, fmt, sync::Arc, thread};

use crossbeam_channel::Receiver;
use log::error;

use crate::{
    options,
    record::LogRecord,
    route::Route,
    transport::{Connection, TransportRegistry},
};

use super::{BuildError, ForwardError, config::ForwarderConfig, identity};

/// Transport kind used when a route does not declare one.
pub const DEFAULT_TRANSPORT: &str = "udp";

/// Ships container log records to a Logstash destination, one compact JSON
/// envelope per transport send.
pub struct LogstashForwarder {
    pub(super) route: Route,
    pub(super) transports: Arc<TransportRegistry>,
    pub(super) config: ForwarderConfig,
    pub(super) conn: Box<dyn Connection>,
}

impl LogstashForwarder {
    /// Construct a forwarder for `route` with default settings, dialling
    /// the destination immediately.
    pub fn new(route: Route, transports: Arc<TransportRegistry>) -> Result<Self, BuildError> {
        Self::with_config(route, transports, ForwarderConfig::default())
    }

    /// Construct a forwarder for `route` with explicit settings.
    ///
    /// Looks up the route's transport kind (falling back to
    /// [`DEFAULT_TRANSPORT`]) and dials the initial connection; either step
    /// failing is a construction error, reported without retry.
    pub fn with_config(
        route: Route,
        transports: Arc<TransportRegistry>,
        config: ForwarderConfig,
    ) -> Result<Self, BuildError> {
        let kind = route.transport_or(DEFAULT_TRANSPORT);
        let transport = transports
            .lookup(kind)
            .ok_or_else(|| BuildError::UnknownTransport(kind.to_owned()))?;
        let conn = transport
            .dial(&route.address, &route.options)
            .map_err(|source| BuildError::Dial {
                address: route.address.clone(),
                source,
            })?;
        Ok(Self {
            route,
            transports,
            config,
            conn,
        })
    }

    /// Consume `records` until the host closes the channel.
    ///
    /// Resolves the process-wide default options from the `OPTIONS`
    /// environment variable and the instance identity once, then forwards
    /// records strictly in order. Returns `Ok(())` when the channel closes
    /// and a terminal [`ForwardError`] when the transport fails past the
    /// single reconnect-and-retry attempt.
    pub fn stream(mut self, records: &Receiver<LogRecord>) -> Result<(), ForwardError> {
        let defaults = options::parse_options(&env::var(options::OPTIONS_ENV).unwrap_or_default());
        let instance_id =
            identity::fetch_instance_id(&self.config.metadata_url, self.config.metadata_timeout);
        self.run(&defaults, &instance_id, records)
    }

    /// Run the forwarder on its own worker thread.
    ///
    /// The terminal outcome is logged and also delivered through the
    /// returned handle's [`join`](ForwarderHandle::join).
    pub fn spawn(self, records: Receiver<LogRecord>) -> ForwarderHandle {
        let worker = thread::spawn(move || {
            let result = self.stream(&records);
            if let Err(err) = &result {
                error!("LogstashForwarder terminated: {err}");
            }
            result
        });
        ForwarderHandle { worker }
    }
}

impl fmt::Debug for LogstashForwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogstashForwarder")
            .field("route", &self.route)
            .field("transports", &self.transports)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Join handle for a spawned forwarder worker.
#[derive(Debug)]
pub struct ForwarderHandle {
    worker: thread::JoinHandle<Result<(), ForwardError>>,
}

impl ForwarderHandle {
    /// Whether the worker has terminated.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and return its terminal outcome. A panicked
    /// worker is reported as [`ForwardError::Panicked`].
    pub fn join(self) -> Result<(), ForwardError> {
        self.worker.join().unwrap_or(Err(ForwardError::Panicked))
    }
}
