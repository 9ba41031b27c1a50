use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use regex::Regex;
use serde::de::{self, Visitor};
use serde::Deserializer;

/// Parse a Go style duration such as `1h`, `30m`, `1h30m`, `1.5h`, `500ms`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("empty duration");
    }
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let re = Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)")?;
    let mut consumed = 0;
    let mut total_nanos: f64 = 0.0;

    for caps in re.captures_iter(trimmed) {
        let whole = caps.get(0).ok_or_else(|| anyhow!("invalid duration '{}'", input))?;
        if whole.start() != consumed {
            bail!("invalid duration '{}'", input);
        }
        consumed = whole.end();

        let value: f64 = caps[1]
            .parse()
            .map_err(|e| anyhow!("invalid duration '{}': {}", input, e))?;
        let unit_nanos = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3600.0 * 1_000_000_000.0,
            unit => bail!("unknown unit '{}' in duration '{}'", unit, input),
        };
        total_nanos += value * unit_nanos;
    }

    if consumed != trimmed.len() {
        bail!("invalid duration '{}'", input);
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// serde `deserialize_with` helper: a duration string or a whole number of seconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a duration string like '1h30m' or a number of seconds")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("negative duration: {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
            parse_duration(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
