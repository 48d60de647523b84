//! HTTP Handlers
//!
//! Library endpoints mounted under `/api/auth`.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use url::{Position, Url};

use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::notifier::ResetPasswordSender;
use crate::application::password_reset::DEFAULT_RESET_CALLBACK;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, CheckSessionUseCase, DeleteAccountUseCase,
    IssuedSession, PasswordResetUseCase, ProfileUseCase, SessionService, SessionWithUser,
    SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase, UpdateProfileInput,
};
use crate::domain::adapter::Adapter;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthResponse, CallbackQuery, ChangePasswordRequest, DeleteUserRequest, ForgetPasswordRequest,
    ResetPasswordRequest, SessionResponse, SessionSummary, SignInRequest, SignUpRequest,
    StatusResponse, TokenQuery, UpdateUserRequest,
};

/// Shared state for auth handlers
pub struct AuthAppState<A> {
    pub adapter: Arc<A>,
    pub config: Arc<AuthConfig>,
    pub reset_sender: Arc<dyn ResetPasswordSender>,
}

impl<A> Clone for AuthAppState<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            config: self.config.clone(),
            reset_sender: self.reset_sender.clone(),
        }
    }
}

impl<A> AuthAppState<A> {
    pub fn new(adapter: A, config: AuthConfig, reset_sender: Arc<dyn ResetPasswordSender>) -> Self {
        Self {
            adapter: Arc::new(adapter),
            config: Arc::new(config),
            reset_sender,
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/sign-up/email
pub async fn sign_up<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<Response>
where
    A: Adapter + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.adapter.clone(), state.config.clone());

    let input = SignUpInput {
        name: req.name,
        email: req.email,
        password: req.password,
        image: req.image,
        remember_me: req.remember_me,
    };

    let output = use_case
        .execute(input, &ClientInfo::from_headers(&headers))
        .await?;

    let cookies = match &output.session {
        Some(issued) => session_cookie_headers(&state.config, issued),
        None => HeaderMap::new(),
    };

    Ok((
        StatusCode::OK,
        cookies,
        Json(AuthResponse {
            token: output.session.map(|issued| issued.session.token),
            user: output.user,
        }),
    )
        .into_response())
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/sign-in/email
pub async fn sign_in<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Response>
where
    A: Adapter + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.adapter.clone(), state.config.clone());

    let input = SignInInput {
        email: req.email,
        password: req.password,
        remember_me: req.remember_me,
    };

    let output = use_case
        .execute(input, &ClientInfo::from_headers(&headers))
        .await?;

    // Max-Age must match remember_me
    let cookies = session_cookie_headers(&state.config, &output.session);

    Ok((
        StatusCode::OK,
        cookies,
        Json(AuthResponse {
            token: Some(output.session.session.token),
            user: output.user,
        }),
    )
        .into_response())
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/sign-out
pub async fn sign_out<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    A: Adapter + Send + Sync + 'static,
{
    let token = read_session_cookie(&headers, &state.config);

    SignOutUseCase::new(state.adapter.clone(), state.config.clone())
        .execute(token.as_deref())
        .await?;

    Ok((
        clear_session_cookie_headers(&state.config),
        Json(StatusResponse::ok()),
    ))
}

// ============================================================================
// Session
// ============================================================================

/// GET /api/auth/get-session
///
/// `null` when signed out; a stale cookie is cleared.
pub async fn get_session<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
) -> AuthResult<Response>
where
    A: Adapter + Send + Sync + 'static,
{
    let had_cookie = read_session_cookie(&headers, &state.config).is_some();

    match resolve_session(&state, &headers).await? {
        Some(found) => {
            let cookies = refreshed_cookie_headers(&state.config, &found);
            Ok((
                cookies,
                Json(Some(SessionResponse {
                    session: found.session,
                    user: found.user,
                })),
            )
                .into_response())
        }
        None if had_cookie => Ok((
            clear_session_cookie_headers(&state.config),
            Json(None::<SessionResponse>),
        )
            .into_response()),
        None => Ok(Json(None::<SessionResponse>).into_response()),
    }
}

/// GET /api/auth/list-sessions
pub async fn list_sessions<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
) -> AuthResult<Json<Vec<SessionSummary>>>
where
    A: Adapter + Send + Sync + 'static,
{
    let current = require_session(&state, &headers).await?;

    let sessions = SessionService::new(state.adapter.clone(), state.config.clone())
        .list(&current.user.id)
        .await?;

    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionSummary::new(s, &current.session.id))
            .collect(),
    ))
}

/// POST /api/auth/revoke-other-sessions
pub async fn revoke_other_sessions<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
) -> AuthResult<Json<StatusResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    let current = require_session(&state, &headers).await?;

    SessionService::new(state.adapter.clone(), state.config.clone())
        .revoke_others(&current.user.id, &current.session)
        .await?;

    Ok(Json(StatusResponse::ok()))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/auth/forget-password
pub async fn forget_password<A>(
    State(state): State<AuthAppState<A>>,
    Json(req): Json<ForgetPasswordRequest>,
) -> AuthResult<Json<StatusResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    reset_use_case(&state)
        .request(&req.email, req.redirect_to.as_deref())
        .await?;

    Ok(Json(StatusResponse::ok()))
}

/// GET /api/auth/reset-password/{token}
///
/// Redirects to the callback with `?token=` or `?error=INVALID_TOKEN`.
pub async fn reset_password_callback<A>(
    State(state): State<AuthAppState<A>>,
    Path(token): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> AuthResult<Response>
where
    A: Adapter + Send + Sync + 'static,
{
    let callback = safe_callback(&state.config, query.callback_url.as_deref());

    let location = match reset_use_case(&state).check_token(&token).await {
        Ok(_) => append_query(&callback, "token", &token),
        Err(AuthError::InvalidToken) => append_query(&callback, "error", "INVALID_TOKEN"),
        Err(e) => return Err(e),
    };

    Ok(redirect(StatusCode::FOUND, &location))
}

/// POST /api/auth/reset-password
pub async fn reset_password<A>(
    State(state): State<AuthAppState<A>>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<StatusResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    let token = req
        .token
        .or(query.token)
        .ok_or(AuthError::InvalidToken)?;

    reset_use_case(&state)
        .reset(&token, req.new_password)
        .await?;

    Ok(Json(StatusResponse::ok()))
}

/// POST /api/auth/change-password
pub async fn change_password<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<Json<StatusResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    let current = require_session(&state, &headers).await?;

    ChangePasswordUseCase::new(state.adapter.clone(), state.config.clone())
        .execute(
            &current.session,
            ChangePasswordInput {
                current_password: req.current_password,
                new_password: req.new_password,
                revoke_other_sessions: req.revoke_other_sessions,
            },
        )
        .await?;

    Ok(Json(StatusResponse::ok()))
}

// ============================================================================
// User
// ============================================================================

/// POST /api/auth/update-user
pub async fn update_user<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Json(req): Json<UpdateUserRequest>,
) -> AuthResult<Json<StatusResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    let current = require_session(&state, &headers).await?;

    ProfileUseCase::new(state.adapter.clone())
        .update(
            &current.user.id,
            UpdateProfileInput {
                name: req.name,
                image: req.image,
            },
        )
        .await?;

    Ok(Json(StatusResponse::ok()))
}

/// POST /api/auth/delete-user
pub async fn delete_user<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Json(req): Json<DeleteUserRequest>,
) -> AuthResult<impl IntoResponse>
where
    A: Adapter + Send + Sync + 'static,
{
    let current = require_session(&state, &headers).await?;

    DeleteAccountUseCase::new(state.adapter.clone(), state.config.clone())
        .execute(&current.session, req.password)
        .await?;

    Ok((
        clear_session_cookie_headers(&state.config),
        Json(StatusResponse::ok()),
    ))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn reset_use_case<A>(state: &AuthAppState<A>) -> PasswordResetUseCase<A>
where
    A: Adapter,
{
    PasswordResetUseCase::new(
        state.adapter.clone(),
        state.config.clone(),
        state.reset_sender.clone(),
    )
}

pub(crate) fn read_session_cookie(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    platform::cookie::extract_cookie(headers, &config.session_cookie(true).name)
}

fn has_dont_remember_cookie(headers: &HeaderMap, config: &AuthConfig) -> bool {
    platform::cookie::extract_cookie(headers, &config.dont_remember_cookie().name).is_some()
}

/// Session behind the request's cookie, if any
pub(crate) async fn resolve_session<A>(
    state: &AuthAppState<A>,
    headers: &HeaderMap,
) -> AuthResult<Option<SessionWithUser>>
where
    A: Adapter,
{
    let token = read_session_cookie(headers, &state.config);
    CheckSessionUseCase::new(state.adapter.clone(), state.config.clone())
        .optional(token.as_deref(), has_dont_remember_cookie(headers, &state.config))
        .await
}

pub(crate) async fn require_session<A>(
    state: &AuthAppState<A>,
    headers: &HeaderMap,
) -> AuthResult<SessionWithUser>
where
    A: Adapter,
{
    resolve_session(state, headers)
        .await?
        .ok_or(AuthError::SessionInvalid)
}

fn append_cookie(headers: &mut HeaderMap, value: Option<HeaderValue>) {
    if let Some(value) = value {
        headers.append(header::SET_COOKIE, value);
    }
}

/// Set-Cookie headers for a new session
pub(crate) fn session_cookie_headers(config: &AuthConfig, issued: &IssuedSession) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append_cookie(
        &mut headers,
        config
            .session_cookie(issued.remember_me)
            .set_header(&issued.cookie_value),
    );
    let dont_remember = config.dont_remember_cookie();
    if issued.remember_me {
        append_cookie(&mut headers, dont_remember.delete_header());
    } else {
        append_cookie(&mut headers, dont_remember.set_header("true"));
    }
    headers
}

/// Re-issue the session cookie after its expiry moved
pub(crate) fn refreshed_cookie_headers(config: &AuthConfig, found: &SessionWithUser) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if found.refreshed {
        let value = crate::application::session_token::sign(&config.secret, &found.session.token);
        append_cookie(&mut headers, config.session_cookie(true).set_header(&value));
    }
    headers
}

/// Expire every auth cookie
pub(crate) fn clear_session_cookie_headers(config: &AuthConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for cookie in [
        config.session_cookie(false),
        config.session_data_cookie(),
        config.dont_remember_cookie(),
    ] {
        append_cookie(&mut headers, cookie.delete_header());
    }
    headers
}

pub(crate) fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => (status, [(header::LOCATION, HeaderValue::from_static("/"))]).into_response(),
    }
}

/// Only same-origin callbacks are followed
///
/// The callback is resolved against the base URL the way a browser would,
/// so `/\host` and scheme-relative forms land on their real origin.
fn safe_callback(config: &AuthConfig, callback: Option<&str>) -> String {
    let Ok(base) = Url::parse(&config.base_url) else {
        return DEFAULT_RESET_CALLBACK.to_string();
    };

    callback
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .and_then(|c| base.join(c).ok())
        .filter(|resolved| resolved.origin() == base.origin())
        .map(|resolved| resolved[Position::BeforePath..].to_string())
        .unwrap_or_else(|| DEFAULT_RESET_CALLBACK.to_string())
}

fn append_query(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{url}{separator}{key}={}",
        platform::url::encode_component(value)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_callback() {
        let config = AuthConfig::development();
        assert_eq!(safe_callback(&config, Some("/auth/reset")), "/auth/reset");
        assert_eq!(
            safe_callback(&config, Some("http://localhost:5173/auth/reset?x=1")),
            "/auth/reset?x=1"
        );
        assert_eq!(
            safe_callback(&config, Some("https://evil.example.com/")),
            DEFAULT_RESET_CALLBACK
        );
        assert_eq!(safe_callback(&config, Some("//evil.example.com")), DEFAULT_RESET_CALLBACK);
        assert_eq!(safe_callback(&config, Some("/\\evil.example.com")), DEFAULT_RESET_CALLBACK);
        assert_eq!(safe_callback(&config, Some("\\\\evil.example.com")), DEFAULT_RESET_CALLBACK);
        assert_eq!(
            safe_callback(&config, Some("javascript:alert(1)")),
            DEFAULT_RESET_CALLBACK
        );
        // an encoded backslash stays an inert path segment
        assert_eq!(
            safe_callback(&config, Some("/%5Cevil.example.com")),
            "/%5Cevil.example.com"
        );
        assert_eq!(safe_callback(&config, None), DEFAULT_RESET_CALLBACK);
    }

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("/reset", "token", "abc"), "/reset?token=abc");
        assert_eq!(append_query("/reset?a=1", "error", "INVALID_TOKEN"), "/reset?a=1&error=INVALID_TOKEN");
    }

    #[test]
    fn test_clear_cookies() {
        let headers = clear_session_cookie_headers(&AuthConfig::development());
        let cookies: Vec<_> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            cookies,
            vec![
                "better-auth.session_token=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax",
                "better-auth.session_data=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax",
                "better-auth.dont_remember=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax",
            ]
        );
    }
}
