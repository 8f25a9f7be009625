// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod rate_limiter;

pub use rate_limiter::*;

use crate::error::ConfigError;

/// Admission control for high-frequency event streams, e.g. one call per
/// memory allocation. Deciding cheaply here is what makes it affordable
/// to skip the expensive work (stack capture) for discarded events.
pub trait EventSampler: Send + Sync {
    /// Sample-or-discard decision for one event occurrence. Safe to call
    /// concurrently from many threads at high frequency.
    fn should_sample(&self) -> bool;

    /// Contributes metadata describing the active sampling strategy to an
    /// output record, so consumers can distinguish sampled data from a
    /// full census.
    fn add_attributes(
        &self,
        str_attr: &mut dyn FnMut(&str, &str),
        num_attr: &mut dyn FnMut(&str, i64),
    );
}

/// Accepts everything and contributes no metadata. Used when sampling is
/// disabled.
#[derive(Default)]
pub struct AlwaysOnSampler;

impl EventSampler for AlwaysOnSampler {
    fn should_sample(&self) -> bool {
        true
    }

    fn add_attributes(
        &self,
        _str_attr: &mut dyn FnMut(&str, &str),
        _num_attr: &mut dyn FnMut(&str, i64),
    ) {
    }
}

/// Admits events under a configured rate budget using a lock-free sliding
/// window ([LocalLimiter]); no global mutex is taken per call.
#[derive(Debug)]
pub struct RateLimitedSampler {
    rate_spec: String,
    limit: u32,
    events_per_second: f64,
    limiter: LocalLimiter,
}

impl RateLimitedSampler {
    /// Builds a sampler from a rate specification of the form
    /// `"<positive-integer>/<unit>"` where unit is `s` or `m`, e.g.
    /// `"100/s"` or `"10/m"`. Any other shape, including embedded
    /// whitespace, fails fast with [ConfigError::InvalidRateLimit].
    pub fn new(rate_spec: &str) -> Result<Self, ConfigError> {
        let (limit, granularity_seconds) = parse_rate_spec(rate_spec)?;
        Ok(Self {
            rate_spec: rate_spec.to_string(),
            limit,
            events_per_second: f64::from(limit) / f64::from(granularity_seconds),
            limiter: LocalLimiter::with_granularity(granularity_seconds),
        })
    }

    /// The configured admission rate normalized to events per second.
    pub fn events_per_second(&self) -> f64 {
        self.events_per_second
    }

    pub fn rate_spec(&self) -> &str {
        &self.rate_spec
    }
}

impl EventSampler for RateLimitedSampler {
    fn should_sample(&self) -> bool {
        self.limiter.inc(self.limit)
    }

    fn add_attributes(
        &self,
        str_attr: &mut dyn FnMut(&str, &str),
        _num_attr: &mut dyn FnMut(&str, i64),
    ) {
        str_attr("sampler.name", "Rate limiting sampler");
        str_attr("sampler.limit", &self.rate_spec);
    }
}

/// Parses a rate spec into (limit, window length in seconds).
fn parse_rate_spec(rate_spec: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidRateLimit {
        spec: rate_spec.to_string(),
    };

    let (value, granularity_seconds) = if let Some(value) = rate_spec.strip_suffix("/s") {
        (value, 1)
    } else if let Some(value) = rate_spec.strip_suffix("/m") {
        (value, 60)
    } else {
        return Err(invalid());
    };

    // u32::from_str rejects signs, whitespace, and empty input, which is
    // exactly the strictness wanted here.
    match value.parse::<u32>() {
        Ok(limit) if limit > 0 => Ok((limit, granularity_seconds)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_per_second_rate() {
        let sampler = RateLimitedSampler::new("100/s").unwrap();
        assert_eq!(100.0, sampler.events_per_second());
        assert_eq!("100/s", sampler.rate_spec());
    }

    #[test]
    fn parses_per_minute_rate() {
        let sampler = RateLimitedSampler::new("100/m").unwrap();
        assert!((sampler.events_per_second() - 100.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_specs() {
        for spec in ["100", "100/h", "1 /s", " 1/s", "-1/s", "0/s", "/s", "1.5/s", "1/s "] {
            match RateLimitedSampler::new(spec) {
                Err(ConfigError::InvalidRateLimit { spec: reported }) => {
                    assert_eq!(spec, reported);
                }
                Ok(_) => panic!("spec {spec:?} should not parse"),
            }
        }
    }

    #[test]
    fn error_message_names_valid_examples() {
        let err = RateLimitedSampler::new("100/h").unwrap_err();
        assert_eq!(
            "invalid rate limit '100/h', valid rate limit is '100/s' or '10/m'",
            err.to_string()
        );
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn accepted_rate_stays_within_burst_window() {
        let sampler = RateLimitedSampler::new("50/s").unwrap();
        let accepted = (0..5_000).filter(|_| sampler.should_sample()).count();
        assert!(accepted >= 50, "accepted only {accepted}");
        assert!(accepted <= 80, "accepted {accepted}, window exceeded");
    }

    #[test]
    fn per_minute_window_admits_one_minute_of_budget() {
        let sampler = RateLimitedSampler::new("60/m").unwrap();
        let accepted = (0..1_000).filter(|_| sampler.should_sample()).count();
        // One window's burst allowance is the full per-minute budget.
        assert!(accepted >= 60, "accepted only {accepted}");
        assert!(accepted <= 70, "accepted {accepted}, window exceeded");
    }

    #[test]
    fn rate_limited_sampler_reports_strategy() {
        let sampler = RateLimitedSampler::new("10/m").unwrap();
        let mut strings = Vec::new();
        let mut nums = Vec::new();
        sampler.add_attributes(
            &mut |key, value| strings.push((key.to_string(), value.to_string())),
            &mut |key, value| nums.push((key.to_string(), value)),
        );
        assert_eq!(
            vec![
                ("sampler.name".to_string(), "Rate limiting sampler".to_string()),
                ("sampler.limit".to_string(), "10/m".to_string()),
            ],
            strings
        );
        assert!(nums.is_empty());
    }

    #[test]
    fn always_on_sampler_accepts_everything_silently() {
        let sampler = AlwaysOnSampler;
        assert!((0..100).all(|_| sampler.should_sample()));

        let count = std::cell::Cell::new(0);
        sampler.add_attributes(
            &mut |_, _| count.set(count.get() + 1),
            &mut |_, _| count.set(count.get() + 1),
        );
        assert_eq!(0, count.get());
    }
}
