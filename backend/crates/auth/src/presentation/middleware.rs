//! Auth Middleware
//!
//! Guards page routes that need a signed-in user.

use axum::body::Body;
use axum::extract::{OriginalUri, State};
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use platform::url::encode_component;

use crate::domain::adapter::Adapter;
use crate::presentation::handlers::{AuthAppState, redirect, refreshed_cookie_headers, resolve_session};

/// Login page anonymous visitors are sent to
pub const LOGIN_PATH: &str = "/auth/login";

/// Require a signed-in user
///
/// Anonymous requests get `303 See Other` to the login page with the
/// original path and query in `next`. On success the [`SessionWithUser`]
/// is available to handlers as a request extension.
///
/// [`SessionWithUser`]: crate::application::SessionWithUser
pub async fn require_user<A>(
    State(state): State<AuthAppState<A>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    // Body is not Sync; keep the request out of the await
    let headers = req.headers().clone();
    let found = match resolve_session(&state, &headers).await {
        Ok(found) => found,
        Err(e) => return e.into_response(),
    };

    let Some(found) = found else {
        // nested routers see the path without their mount prefix
        let uri = req
            .extensions()
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| req.uri().clone());
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        tracing::debug!(path = %target, "Anonymous request redirected to login");
        return redirect(
            StatusCode::SEE_OTHER,
            &format!("{LOGIN_PATH}?next={}", encode_component(&target)),
        );
    };

    let cookies = refreshed_cookie_headers(&state.config, &found);
    req.extensions_mut().insert(found);

    let mut response = next.run(req).await;
    for value in cookies.get_all(header::SET_COOKIE) {
        response.headers_mut().append(header::SET_COOKIE, value.clone());
    }
    response
}
