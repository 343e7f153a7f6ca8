use chrono::{DateTime, SecondsFormat, Utc};
use portfolio_models::contact::{
    ContactMessage, ContactMessageDraft, ContactMessageField, ContactValidationViolation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl From<ContactMessage> for ApiContactMessage {
    fn from(value: ContactMessage) -> Self {
        Self {
            id: *value.id,
            name: value.name.into_inner(),
            email: value.email.into_inner(),
            message: value.message.into_inner(),
            created_at: value.created_at,
        }
    }
}

pub fn serialize_timestamp<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiContactValidationError {
    pub field: ContactMessageField,
    pub message: &'static str,
}

impl From<ContactValidationViolation> for ApiContactValidationError {
    fn from(value: ContactValidationViolation) -> Self {
        Self {
            field: value.field,
            message: value.message,
        }
    }
}

/// Contact form submitted as `application/x-www-form-urlencoded`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl From<ApiContactForm> for ContactMessageDraft {
    fn from(value: ApiContactForm) -> Self {
        Self {
            name: value.name,
            email: value.email,
            message: value.message,
        }
    }
}

/// Build a draft from an arbitrary JSON document.
///
/// Strings are taken as is, numbers and booleans are converted to text.
/// Anything else counts as missing.
pub fn draft_from_json(value: &Value) -> ContactMessageDraft {
    let field = |name: &str| match value.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    ContactMessageDraft {
        name: field("name"),
        email: field("email"),
        message: field("message"),
    }
}
