use std::sync::Arc;

use axum::{
    extract::Request,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderValue, Method, StatusCode,
    },
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

/// Origins that may call the API from a browser.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    /// Origin of the deployed client, accepted in addition to
    /// `allowed_origins`.
    pub client_url: Option<String>,
}

impl CorsPolicy {
    pub fn allows(&self, origin: Option<&str>) -> bool {
        is_origin_allowed(origin, &self.allowed_origins, self.client_url.as_deref())
    }
}

/// Decide whether a request declaring `origin` may be served.
///
/// Requests without an origin (same origin, server to server) are always
/// allowed. At most one trailing slash is ignored on either side.
pub fn is_origin_allowed(
    origin: Option<&str>,
    allowed_origins: &[impl AsRef<str>],
    client_url: Option<&str>,
) -> bool {
    let Some(origin) = origin else {
        return true;
    };
    let origin = strip_trailing_slash(origin);

    allowed_origins
        .iter()
        .map(|allowed| allowed.as_ref())
        .chain(client_url)
        .any(|allowed| strip_trailing_slash(allowed) == origin)
}

fn strip_trailing_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

pub fn add<S: Clone + Send + Sync + 'static>(
    policy: Arc<CorsPolicy>,
) -> impl FnOnce(Router<S>) -> Router<S> {
    |router| {
        // answers every `OPTIONS` request, so routes never see one
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::predicate({
                let policy = Arc::clone(&policy);
                move |origin: &HeaderValue, _| policy.allows(origin.to_str().ok())
            }))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true);

        router
            .layer(cors)
            .layer(from_fn(move |request: Request, next: Next| {
                let policy = Arc::clone(&policy);
                async move { reject_disallowed_origin(&policy, request, next).await }
            }))
    }
}

async fn reject_disallowed_origin(policy: &CorsPolicy, request: Request, next: Next) -> Response {
    let origin = request.headers().get(ORIGIN);
    let allowed = match origin {
        Some(value) => value.to_str().is_ok_and(|origin| policy.allows(Some(origin))),
        None => true,
    };

    if !allowed {
        debug!(?origin, "rejecting request from disallowed origin");
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(request).await
}
