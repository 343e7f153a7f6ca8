use std::{ops::Deref, str::FromStr};

use serde::Deserialize;

/// A duration written as whitespace separated parts like `1h 30m`.
///
/// Supported units are `s`, `m`, `h` and `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDuration(String);

impl std::fmt::Display for InvalidDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid duration: {:?}", self.0)
    }
}

impl std::error::Error for InvalidDuration {}

impl FromStr for Duration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDuration(s.into());

        s.split_whitespace()
            .try_fold(std::time::Duration::ZERO, |total, part| {
                let unit_pos = part.len().checked_sub(1).ok_or_else(invalid)?;
                let (value, unit) = part.split_at(unit_pos);
                let value = value.parse::<u64>().map_err(|_| invalid())?;
                let factor = match unit {
                    "s" => 1,
                    "m" => 60,
                    "h" => 60 * 60,
                    "d" => 24 * 60 * 60,
                    _ => return Err(invalid()),
                };
                value
                    .checked_mul(factor)
                    .map(std::time::Duration::from_secs)
                    .and_then(|d| total.checked_add(d))
                    .ok_or_else(invalid)
            })
            .map(Self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration() {
        for (input, expected) in [
            ("13s", Some(13)),
            ("15m", Some(15 * 60)),
            ("7h", Some(7 * 60 * 60)),
            ("2d", Some(2 * 24 * 60 * 60)),
            ("", Some(0)),
            ("1h 30m", Some(90 * 60)),
            ("1d 2h 3m 4s", Some(((24 + 2) * 60 + 3) * 60 + 4)),
            ("xyz", None),
            ("7dd", None),
            ("m", None),
            ("-5s", None),
        ] {
            let output = serde_json::from_value::<Duration>(input.into())
                .ok()
                .map(|x| x.as_secs());
            assert_eq!(output, expected, "{input}");
        }
    }
}
