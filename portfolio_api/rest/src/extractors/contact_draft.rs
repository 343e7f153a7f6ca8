use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use portfolio_models::contact::ContactMessageDraft;
use tracing::debug;

use crate::models::contact::{draft_from_json, ApiContactForm};

/// Extract a contact form submission from a JSON or urlencoded body.
///
/// Bodies that cannot be parsed yield an empty draft, so the submission is
/// rejected by validation instead of failing early.
pub struct ContactDraftBody(pub ContactMessageDraft);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for ContactDraftBody {
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| {
                mime.trim()
                    .eq_ignore_ascii_case("application/x-www-form-urlencoded")
            });

        let body = Bytes::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if body.is_empty() {
            return Ok(Self(ContactMessageDraft::default()));
        }

        let draft = if is_form {
            serde_urlencoded::from_bytes::<ApiContactForm>(&body)
                .map(Into::into)
                .map_err(|err| err.to_string())
        } else {
            serde_json::from_slice::<serde_json::Value>(&body)
                .map(|value| draft_from_json(&value))
                .map_err(|err| err.to_string())
        };

        Ok(Self(draft.unwrap_or_else(|err| {
            debug!(%err, "ignoring malformed contact request body");
            ContactMessageDraft::default()
        })))
    }
}
