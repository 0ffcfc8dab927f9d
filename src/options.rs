//! Option mapping resolution.
//!
//! Two layers of options feed every forwarded envelope: a process-wide
//! default mapping, serialised as JSON in the `OPTIONS` environment variable
//! and parsed once per stream, and a per-source mapping a container declares
//! through an environment entry prefixed `LOGSPOUT_OPTIONS=`. The functions
//! here parse both layers and merge them, source values winning.

use std::collections::BTreeMap;

use log::warn;

/// Mapping of option keys to values attached to forwarded envelopes.
pub type OptionsMap = BTreeMap<String, String>;

/// Environment variable carrying the process-wide default options JSON.
pub const OPTIONS_ENV: &str = "OPTIONS";

/// Prefix marking a source environment entry as per-source options JSON.
///
/// The trailing `=` means the whole remainder of the entry is the payload.
/// The match is exact and case-sensitive; this is a stable contract for log
/// sources, not an implementation detail.
pub const LOGSPOUT_OPTIONS_PREFIX: &str = "LOGSPOUT_OPTIONS=";

/// Return the raw options payload of the first environment entry carrying
/// [`LOGSPOUT_OPTIONS_PREFIX`], if any.
pub fn logspout_options(env: &[String]) -> Option<&str> {
    env.iter()
        .find_map(|entry| entry.strip_prefix(LOGSPOUT_OPTIONS_PREFIX))
}

/// Parse a serialised options object into a mapping.
///
/// Empty input yields an empty mapping. Malformed JSON is logged and
/// suppressed, also yielding an empty mapping, so a misconfigured source
/// never stalls forwarding.
pub fn parse_options(raw: &str) -> OptionsMap {
    if raw.is_empty() {
        return OptionsMap::new();
    }
    match serde_json::from_str(raw) {
        Ok(options) => options,
        Err(err) => {
            warn!("ignoring malformed options JSON: {err}");
            OptionsMap::new()
        }
    }
}

/// Options a source declares for itself through its environment.
pub fn source_options(env: &[String]) -> OptionsMap {
    logspout_options(env).map(parse_options).unwrap_or_default()
}

/// Merge `defaults` beneath `source`: every default key absent from `source`
/// is copied in, and source values win on conflict.
pub fn merge(defaults: &OptionsMap, source: OptionsMap) -> OptionsMap {
    if source.is_empty() {
        return defaults.clone();
    }
    let mut merged = source;
    for (key, value) in defaults {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}

/// Resolve the effective options for one record: the source's own options
/// overlaid on the process-wide `defaults`.
pub fn resolve(defaults: &OptionsMap, env: &[String]) -> OptionsMap {
    merge(defaults, source_options(env))
}
