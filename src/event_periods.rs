// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Period value for events whose recurrence is not configured or not
/// parseable.
pub const UNKNOWN: Duration = Duration::ZERO;

/// Resolves the configured recurrence period of named recurring events,
/// memoizing every resolution, including failed ones. Event names are a
/// small, finite, known set, so the cache is unbounded for the process
/// lifetime.
pub struct EventPeriods {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
    cache: Mutex<HashMap<String, Duration>>,
}

impl EventPeriods {
    pub fn new(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The configured period of the event, or [UNKNOWN]. The injected
    /// lookup is invoked at most once per event name, even when the first
    /// resolution was [UNKNOWN] -- caching only successes would hammer the
    /// config source with repeated failed lookups.
    pub fn duration(&self, event_name: &str) -> Duration {
        let mut cache = self.cache.lock();
        if let Some(duration) = cache.get(event_name) {
            return *duration;
        }

        let key = format!("{event_name}#period");
        let duration = match (self.lookup)(&key) {
            Some(value) => parse_period(event_name, &value),
            None => UNKNOWN,
        };
        cache.insert(event_name.to_string(), duration);
        duration
    }
}

fn parse_period(event_name: &str, value: &str) -> Duration {
    // JFR configs sometimes carry the literal "everyChunk" instead of an
    // actual value; it has no usable magnitude.
    let Some((magnitude, unit)) = value.split_once(' ') else {
        debug!(event_name, value, "event period has no unit, treating as unknown");
        return UNKNOWN;
    };
    let Ok(magnitude) = magnitude.parse::<u64>() else {
        debug!(event_name, value, "event period is not numeric, treating as unknown");
        return UNKNOWN;
    };
    match unit {
        "ms" => Duration::from_millis(magnitude),
        "s" => Duration::from_secs(magnitude),
        _ => {
            debug!(event_name, value, "unrecognized event period unit, treating as unknown");
            UNKNOWN
        }
    }
}
