use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Extension, Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use portfolio_core_contact_contracts::{
    ContactCreateMessageError, ContactFeatureService, ContactListMessagesError,
};
use serde::Serialize;

use super::{error, internal_server_error};
use crate::{
    extractors::contact_draft::ContactDraftBody,
    middlewares::client_ip::ClientIp,
    models::contact::{ApiContactMessage, ApiContactValidationError},
};

#[derive(Debug)]
pub struct ContactState<Contact> {
    pub service: Contact,
    /// Bearer token required to list messages. Listing is public if unset.
    pub admin_token: Option<String>,
}

pub fn router(state: Arc<ContactState<impl ContactFeatureService>>) -> Router<()> {
    Router::new()
        .route(
            "/contact",
            routing::post(create_message).get(list_messages),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct CreateMessageResponse {
    success: bool,
    data: ApiContactMessage,
    message: &'static str,
}

#[derive(Serialize)]
struct ValidationErrorResponse {
    success: bool,
    errors: Vec<ApiContactValidationError>,
}

#[derive(Serialize)]
struct ListMessagesResponse {
    success: bool,
    count: usize,
    data: Vec<ApiContactMessage>,
}

async fn create_message(
    State(state): State<Arc<ContactState<impl ContactFeatureService>>>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
    ContactDraftBody(draft): ContactDraftBody,
) -> Response {
    match state.service.create_message(client_ip, draft).await {
        Ok(message) => (
            StatusCode::CREATED,
            Json(CreateMessageResponse {
                success: true,
                data: message.into(),
                message: "Message sent successfully!",
            }),
        )
            .into_response(),
        Err(ContactCreateMessageError::RateLimited { limit, retry_after }) => {
            too_many_requests(limit, retry_after)
        }
        Err(ContactCreateMessageError::Validation(violations)) => (
            StatusCode::BAD_REQUEST,
            Json(ValidationErrorResponse {
                success: false,
                errors: violations.into_iter().map(Into::into).collect(),
            }),
        )
            .into_response(),
        Err(ContactCreateMessageError::Other(err)) => {
            internal_server_error(err, "Server error. Please try again later.")
        }
    }
}

fn too_many_requests(limit: u64, retry_after: Duration) -> Response {
    let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    (
        [
            ("Retry-After", seconds.to_string()),
            ("RateLimit-Limit", limit.to_string()),
            ("RateLimit-Remaining", "0".into()),
            ("RateLimit-Reset", seconds.to_string()),
        ],
        error(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many contact attempts, please try again after 15 minutes",
        ),
    )
        .into_response()
}

async fn list_messages(
    State(state): State<Arc<ContactState<impl ContactFeatureService>>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Response {
    if let Some(admin_token) = &state.admin_token {
        let authorized = bearer.is_some_and(|TypedHeader(Authorization(bearer))| {
            bearer.token() == admin_token.as_str()
        });
        if !authorized {
            return error(StatusCode::UNAUTHORIZED, "Not authorized");
        }
    }

    match state.service.list_messages().await {
        Ok(messages) => Json(ListMessagesResponse {
            success: true,
            count: messages.len(),
            data: messages.into_iter().map(Into::into).collect(),
        })
        .into_response(),
        Err(ContactListMessagesError::Other(err)) => internal_server_error(err, "Server error"),
    }
}
