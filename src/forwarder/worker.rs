//! Streaming loop: per-record option resolution, enrichment, serialisation
//! and transport writes.

use crossbeam_channel::Receiver;
use log::warn;

use crate::{
    envelope::Envelope,
    options::{self, OptionsMap},
    record::LogRecord,
};

use super::{DEFAULT_TRANSPORT, ForwardError, LogstashForwarder};

impl LogstashForwarder {
    /// Forward every record `records` yields until the channel closes.
    ///
    /// `defaults` and `instance_id` are resolved once by the caller; only
    /// the per-source options vary between records.
    pub(super) fn run(
        &mut self,
        defaults: &OptionsMap,
        instance_id: &str,
        records: &Receiver<LogRecord>,
    ) -> Result<(), ForwardError> {
        while let Ok(record) = records.recv() {
            let merged = options::resolve(defaults, &record.container.env);
            let envelope = Envelope::enrich(&record, instance_id, merged);
            let payload = match serde_json::to_vec(&envelope) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!("LogstashForwarder serialisation error: {err}");
                    continue;
                }
            };
            self.deliver(&payload)?;
        }
        Ok(())
    }

    /// Write one envelope, reconnecting and retrying exactly once when the
    /// first write fails.
    fn deliver(&mut self, payload: &[u8]) -> Result<(), ForwardError> {
        let Err(err) = self.conn.send(payload) else {
            return Ok(());
        };
        warn!("LogstashForwarder write failed: {err}; reconnecting");
        self.reconnect()?;
        self.conn.send(payload).map_err(ForwardError::RetryFailed)
    }

    /// Replace the dead connection with a freshly dialled one. Lookup and
    /// dial failures here are terminal.
    fn reconnect(&mut self) -> Result<(), ForwardError> {
        let kind = self.route.transport_or(DEFAULT_TRANSPORT);
        let transport = self
            .transports
            .lookup(kind)
            .ok_or_else(|| ForwardError::UnknownTransport(kind.to_owned()))?;
        self.conn = transport
            .dial(&self.route.address, &self.route.options)
            .map_err(|source| ForwardError::Reconnect {
                address: self.route.address.clone(),
                source,
            })?;
        Ok(())
    }
}
