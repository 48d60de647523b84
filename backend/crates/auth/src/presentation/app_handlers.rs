//! Application endpoints
//!
//! Thin routes the web app calls next to the library endpoints. Errors are
//! answered as `{ "error": message }` with the status each route promises.

use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use kernel::error::kind::ErrorKind;
use serde::de::DeserializeOwned;

use platform::client::ClientInfo;

use crate::application::{
    DevLoginInput, DevLoginUseCase, PasswordResetUseCase, ProfileUseCase, ProvidersUseCase,
    SessionWithUser, SignOutUseCase, UpdateProfileInput,
};
use crate::domain::adapter::Adapter;
use crate::error::AuthError;
use crate::infra::value::RecordId;
use crate::presentation::dto::{
    CurrentUserResponse, DevLoginRequest, OkResponse, ProfileResponse, ProviderRequest,
    ProvidersResponse, ResetRequest, UpdateUserRequest,
};
use crate::presentation::handlers::{
    AuthAppState, clear_session_cookie_headers, read_session_cookie, redirect, refreshed_cookie_headers,
    require_session, resolve_session, session_cookie_headers,
};

/// Unparseable bodies count as empty ones
fn lenient_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

fn fail(err: AuthError, kind: ErrorKind) -> Response {
    err.log();
    err.to_app_error_as(kind).into_response()
}

/// The body's `userId`, when given, must name the signed-in user
fn same_user(requested: Option<&str>, user_id: &str) -> bool {
    match requested.map(str::trim).filter(|r| !r.is_empty()) {
        None => true,
        Some(requested) => {
            RecordId::parse_or(requested, "user").is_ok_and(|r| r.to_string() == user_id)
        }
    }
}

/// GET /api/auth/session
pub async fn current_user<A>(State(state): State<AuthAppState<A>>, headers: HeaderMap) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    match resolve_session(&state, &headers).await {
        Ok(found) => {
            let cookies = found
                .as_ref()
                .map(|f| refreshed_cookie_headers(&state.config, f))
                .unwrap_or_default();
            (
                cookies,
                Json(CurrentUserResponse {
                    user: found.map(|f| f.user),
                }),
            )
                .into_response()
        }
        Err(e) => fail(e, ErrorKind::BadRequest),
    }
}

/// POST /api/auth/reset-request
pub async fn reset_request<A>(State(state): State<AuthAppState<A>>, body: Bytes) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    let req: ResetRequest = lenient_body(&body);

    let use_case = PasswordResetUseCase::new(
        state.adapter.clone(),
        state.config.clone(),
        state.reset_sender.clone(),
    );
    match use_case.request(&req.email, None).await {
        Ok(()) => Json(OkResponse::ok()).into_response(),
        Err(e) => fail(e, ErrorKind::BadRequest),
    }
}

/// POST /api/auth/provider/link
pub async fn link_provider<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    let req: ProviderRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(_) => {
            return fail(
                AuthError::InvalidInput("Invalid request body".to_string()),
                ErrorKind::BadRequest,
            );
        }
    };

    let result = async {
        let current = require_session(&state, &headers).await?;
        if !same_user(req.user_id.as_deref(), &current.user.id) {
            return Err(AuthError::SessionInvalid);
        }
        ProvidersUseCase::new(state.adapter.clone())
            .link(&current.user.id, &req.provider)
            .await
    }
    .await;

    match result {
        Ok(providers) => Json(ProvidersResponse::new(providers)).into_response(),
        Err(e) => fail(e, ErrorKind::BadRequest),
    }
}

/// POST /api/auth/provider/unlink
pub async fn unlink_provider<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    let req: Option<ProviderRequest> = serde_json::from_slice(&body).ok();
    let provider = req.map(|r| r.provider).unwrap_or_default();

    let result = async {
        let current = require_session(&state, &headers).await?;
        ProvidersUseCase::new(state.adapter.clone())
            .unlink(&current.user.id, &provider)
            .await
    }
    .await;

    match result {
        Ok(providers) => Json(ProvidersResponse::new(providers)).into_response(),
        Err(e) => fail(e, ErrorKind::BadRequest),
    }
}

/// GET /api/auth/provider/list
pub async fn list_providers<A>(State(state): State<AuthAppState<A>>, headers: HeaderMap) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    let result = async {
        let current = require_session(&state, &headers).await?;
        ProvidersUseCase::new(state.adapter.clone())
            .list(&current.user.id)
            .await
    }
    .await;

    match result {
        Ok(providers) => Json(ProvidersResponse::new(providers)).into_response(),
        Err(e) => fail(e, ErrorKind::Unauthorized),
    }
}

/// POST /api/dev-login
pub async fn dev_login<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    let req: DevLoginRequest = lenient_body(&body);

    let use_case = DevLoginUseCase::new(state.adapter.clone(), state.config.clone());
    let input = DevLoginInput {
        email: req.email,
        password: req.password,
        name: req.name,
    };

    match use_case.execute(input, &ClientInfo::from_headers(&headers)).await {
        Ok(output) => (
            session_cookie_headers(&state.config, &output.session),
            Json(OkResponse::ok()),
        )
            .into_response(),
        Err(e @ AuthError::DevLoginDisabled) => fail(e, ErrorKind::NotFound),
        Err(e @ AuthError::InvalidCredentials) => fail(e, ErrorKind::Unauthorized),
        Err(e) => fail(e, ErrorKind::BadRequest),
    }
}

/// POST /auth/logout
///
/// Always ends in `303` to `/` with the auth cookies cleared.
pub async fn logout<A>(State(state): State<AuthAppState<A>>, headers: HeaderMap) -> Response
where
    A: Adapter + Send + Sync + 'static,
{
    let token = read_session_cookie(&headers, &state.config);
    if let Err(e) = SignOutUseCase::new(state.adapter.clone(), state.config.clone())
        .execute(token.as_deref())
        .await
    {
        tracing::warn!(error = %e, "Sign out failed, clearing cookies anyway");
    }

    (
        clear_session_cookie_headers(&state.config),
        redirect(StatusCode::SEE_OTHER, "/"),
    )
        .into_response()
}

/// GET /user/profile
pub async fn get_profile<A>(
    State(state): State<AuthAppState<A>>,
    Extension(current): Extension<SessionWithUser>,
) -> Result<Json<ProfileResponse>, AuthError>
where
    A: Adapter + Send + Sync + 'static,
{
    let user = ProfileUseCase::new(state.adapter.clone())
        .get(&current.user.id)
        .await?;
    Ok(Json(user.into()))
}

/// POST /user/profile
pub async fn update_profile<A>(
    State(state): State<AuthAppState<A>>,
    Extension(current): Extension<SessionWithUser>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ProfileResponse>, AuthError>
where
    A: Adapter + Send + Sync + 'static,
{
    let user = ProfileUseCase::new(state.adapter.clone())
        .update(
            &current.user.id,
            UpdateProfileInput {
                name: req.name,
                image: req.image,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_user() {
        assert!(same_user(None, "user:abc"));
        assert!(same_user(Some(""), "user:abc"));
        assert!(same_user(Some("user:abc"), "user:abc"));
        assert!(same_user(Some("abc"), "user:abc"));
        assert!(!same_user(Some("user:xyz"), "user:abc"));
    }

    #[test]
    fn test_lenient_body() {
        let req: ResetRequest = lenient_body(&Bytes::from_static(b"not json"));
        assert_eq!(req.email, "");
        let req: ResetRequest = lenient_body(&Bytes::from_static(br#"{"email":"a@b.co"}"#));
        assert_eq!(req.email, "a@b.co");
    }
}
