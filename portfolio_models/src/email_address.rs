use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// A syntactically valid email address in canonical form.
///
/// The address is trimmed and lower-cased. Gmail addresses additionally lose
/// any dots and `+tag` in the local part and use the `gmail.com` domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid email address")]
pub struct InvalidEmailAddress;

const GMAIL_DOMAINS: [&str; 2] = ["gmail.com", "googlemail.com"];

impl EmailAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an address that has already been validated and normalized, e.g.
    /// one read back from the database.
    pub fn new_unchecked(address: String) -> Self {
        Self(address)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for EmailAddress {
    type Err = InvalidEmailAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = s
            .trim()
            .parse::<lettre::Address>()
            .map_err(|_| InvalidEmailAddress)?;

        // lower-casing may leave the address grammar, e.g. `İ` becomes `i\u{307}`
        let normalized = normalize(address.as_ref());
        normalized
            .parse::<lettre::Address>()
            .map_err(|_| InvalidEmailAddress)?;

        Ok(Self(normalized))
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = InvalidEmailAddress;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn normalize(address: &str) -> String {
    let address = address.to_lowercase();
    let Some((local, domain)) = address.rsplit_once('@') else {
        return address;
    };

    if !GMAIL_DOMAINS.contains(&domain) {
        return address;
    }

    let local = local
        .split('+')
        .next()
        .unwrap_or_default()
        .replace('.', "");
    if local.is_empty() {
        return address;
    }

    format!("{local}@gmail.com")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lowercases() {
        let email = "A@B.COM".parse::<EmailAddress>().unwrap();
        assert_eq!(email.as_str(), "a@b.com");
    }

    #[test]
    fn trims() {
        let email = "  max@example.com ".parse::<EmailAddress>().unwrap();
        assert_eq!(email.as_str(), "max@example.com");
    }

    #[test]
    fn canonical_gmail() {
        for input in [
            "Max.Mustermann+portfolio@gmail.com",
            "maxmustermann@googlemail.com",
            "m.a.x.mustermann@GMAIL.com",
        ] {
            let email = input.parse::<EmailAddress>().unwrap();
            assert_eq!(email.as_str(), "maxmustermann@gmail.com");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in [
            "Max.Mustermann+portfolio@gmail.com",
            "Someone@Example.ORG",
            "first.last+tag@example.com",
        ] {
            let once = input.parse::<EmailAddress>().unwrap();
            let twice = once.as_str().parse::<EmailAddress>().unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn keeps_subaddress_outside_gmail() {
        let email = "First.Last+tag@example.com".parse::<EmailAddress>().unwrap();
        assert_eq!(email.as_str(), "first.last+tag@example.com");
    }

    #[test]
    fn invalid() {
        for input in ["", "   ", "not-an-email", "@example.com", "max@", "a b@example.com"] {
            assert_eq!(input.parse::<EmailAddress>(), Err(InvalidEmailAddress));
        }
    }

    #[test]
    fn lowercase_must_stay_valid() {
        assert_eq!(
            "İnfo@example.com".parse::<EmailAddress>(),
            Err(InvalidEmailAddress)
        );
    }

    #[test]
    fn accepted_addresses_parse_again() {
        for input in ["ÄÖÜ@example.com", "Max@Example.COM", "o'brien@example.com"] {
            let Ok(email) = input.parse::<EmailAddress>() else {
                continue;
            };
            assert_eq!(email.as_str().parse::<EmailAddress>(), Ok(email.clone()), "{input:?}");
        }
    }

    #[test]
    fn serializes_as_string() {
        let email = "max@example.com".parse::<EmailAddress>().unwrap();
        assert_eq!(
            serde_json::to_value(&email).unwrap(),
            serde_json::json!("max@example.com")
        );
    }
}
