//! Output envelope construction and serialisation rules.
//!
//! This module defines the flat JSON document written to the destination for
//! each forwarded record: the raw message, the source container metadata
//! under `docker.`-prefixed keys, the merged option mapping, and the instance
//! identity when one was resolved.

use serde::{Deserialize, Serialize};

use crate::{options::OptionsMap, record::LogRecord};

/// Flat JSON document emitted for one log record.
///
/// Field order here is serialisation order on the wire. `args`, `options`
/// and `instance_id` are omitted from the output while empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Raw text payload of the record.
    pub message: String,
    /// Container name.
    #[serde(rename = "docker.name")]
    pub name: String,
    /// Container identifier.
    #[serde(rename = "docker.id")]
    pub id: String,
    /// Image the container was started from.
    #[serde(rename = "docker.image")]
    pub image: String,
    /// Hostname inside the container.
    #[serde(rename = "docker.hostname")]
    pub hostname: String,
    /// Entrypoint arguments, omitted when empty.
    #[serde(rename = "docker.args", default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Merged option mapping, omitted when empty.
    #[serde(default, skip_serializing_if = "OptionsMap::is_empty")]
    pub options: OptionsMap,
    /// Instance identity of the forwarding host, omitted when empty.
    #[serde(
        rename = "instance-id",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub instance_id: String,
}

impl Envelope {
    /// Build the envelope for `record`, attaching the resolved `instance_id`
    /// and merged `options`. Pure: the inputs are copied, never mutated.
    pub fn enrich(record: &LogRecord, instance_id: &str, options: OptionsMap) -> Self {
        Self {
            message: record.data.clone(),
            name: record.container.name.clone(),
            id: record.container.id.clone(),
            image: record.container.image.clone(),
            hostname: record.container.hostname.clone(),
            args: record.container.args.clone(),
            options,
            instance_id: instance_id.to_owned(),
        }
    }
}
