use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::Serialize;

use crate::{email_address::EmailAddress, macros::id};

id!(ContactMessageId);

/// A stored contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: ContactMessageAuthorName,
    pub email: EmailAddress,
    pub message: ContactMessageContent,
    pub created_at: DateTime<Utc>,
}

/// A submission that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub name: ContactMessageAuthorName,
    pub email: EmailAddress,
    pub message: ContactMessageContent,
}

/// The raw contact form payload as submitted by the client.
///
/// Every member may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactMessageDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

#[nutype(
    sanitize(trim),
    validate(
        len_char_min = ContactMessageAuthorName::MIN_LENGTH,
        len_char_max = ContactMessageAuthorName::MAX_LENGTH
    ),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageAuthorName(String);

impl ContactMessageAuthorName {
    pub const MIN_LENGTH: usize = 2;
    pub const MAX_LENGTH: usize = 50;
}

#[nutype(
    sanitize(trim),
    validate(
        len_char_min = ContactMessageContent::MIN_LENGTH,
        len_char_max = ContactMessageContent::MAX_LENGTH
    ),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageContent(String);

impl ContactMessageContent {
    pub const MIN_LENGTH: usize = 10;
    pub const MAX_LENGTH: usize = 1000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMessageField {
    Name,
    Email,
    Message,
}

/// A single failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactValidationViolation {
    pub field: ContactMessageField,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_name_is_trimmed() {
        let name = ContactMessageAuthorName::try_from("  Al  ").unwrap();
        assert_eq!(name.as_str(), "Al");
    }

    #[test]
    fn author_name_length_is_checked_after_trimming() {
        assert!(ContactMessageAuthorName::try_from(" A ").is_err());
        assert!(ContactMessageAuthorName::try_from("a".repeat(50)).is_ok());
        assert!(ContactMessageAuthorName::try_from("a".repeat(51)).is_err());
    }

    #[test]
    fn content_bounds() {
        assert!(ContactMessageContent::try_from("123456789").is_err());
        assert!(ContactMessageContent::try_from("1234567890").is_ok());
        assert!(ContactMessageContent::try_from("x".repeat(1000)).is_ok());
        assert!(ContactMessageContent::try_from("x".repeat(1001)).is_err());
    }
}
