//! Prompt endpoints
//!
//! `/api/admin/prompts/*` needs a signed-in user; `/api/prompts/*` is public.
//! Errors are `{ "error": message }`, 400 unless the session is missing (401)
//! or a single prompt lookup misses (404).

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use kernel::error::kind::ErrorKind;
use serde::de::DeserializeOwned;

use crate::application::{CreatePromptInput, PromptService, UpdatePromptInput};
use crate::domain::adapter::Adapter;
use crate::domain::entity::prompt::PromptKind;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CreatePromptRequest, DefaultPromptResponse, PromptAnalyticsResponse, PromptResponse,
    PromptTypeQuery, PromptsResponse, SetDefaultPromptRequest, SuccessResponse,
    TogglePromptActiveRequest, UpdatePromptRequest,
};
use crate::presentation::handlers::{AuthAppState, require_session};

fn fail(err: AuthError) -> Response {
    let kind = match &err {
        AuthError::SessionInvalid => ErrorKind::Unauthorized,
        AuthError::PromptNotFound => ErrorKind::NotFound,
        _ => ErrorKind::BadRequest,
    };
    err.log();
    err.to_app_error_as(kind).into_response()
}

/// [`AuthError`] answered with the prompt routes' statuses
#[derive(Debug)]
pub struct PromptError(AuthError);

impl From<AuthError> for PromptError {
    fn from(err: AuthError) -> Self {
        PromptError(err)
    }
}

impl IntoResponse for PromptError {
    fn into_response(self) -> Response {
        fail(self.0)
    }
}

type PromptResult<T> = Result<T, PromptError>;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> AuthResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| AuthError::InvalidInput(format!("Invalid request body: {e}")))
}

fn required_kind(query: &PromptTypeQuery) -> AuthResult<PromptKind> {
    query
        .kind
        .as_deref()
        .filter(|kind| !kind.is_empty())
        .ok_or_else(|| {
            AuthError::InvalidInput("Type parameter is required (analysis or generation)".into())
        })?
        .parse()
}

fn service<A: Adapter>(state: &AuthAppState<A>) -> PromptService<A> {
    PromptService::new(state.adapter.clone())
}

/// GET /api/admin/prompts?type=
pub async fn list_prompts<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Query(query): Query<PromptTypeQuery>,
) -> PromptResult<Json<PromptsResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    require_session(&state, &headers).await?;
    let kind = match query.kind.as_deref().filter(|k| !k.is_empty()) {
        Some(kind) => Some(kind.parse::<PromptKind>()?),
        None => None,
    };
    let prompts = service(&state).list(kind).await?;
    Ok(Json(PromptsResponse {
        prompts: prompts.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/admin/prompts
pub async fn create_prompt<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    body: Bytes,
) -> PromptResult<(StatusCode, Json<PromptResponse>)>
where
    A: Adapter + Send + Sync + 'static,
{
    let found = require_session(&state, &headers).await?;
    let req: CreatePromptRequest = parse_body(&body)?;
    let input = CreatePromptInput {
        name: req.name,
        description: req.description,
        kind: req.kind.parse()?,
        prompt_text: req.prompt_text,
        tags: req.tags.unwrap_or_default(),
    };
    let prompt = service(&state).create(&found.user.id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(PromptResponse {
            prompt: prompt.into(),
        }),
    ))
}

/// GET /api/admin/prompts/{id}
pub async fn get_prompt<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> PromptResult<Json<PromptResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    require_session(&state, &headers).await?;
    let prompt = service(&state)
        .get(&id)
        .await?
        .ok_or(AuthError::PromptNotFound)?;
    Ok(Json(PromptResponse {
        prompt: prompt.into(),
    }))
}

/// PUT /api/admin/prompts/{id}
pub async fn update_prompt<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> PromptResult<Json<PromptResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    require_session(&state, &headers).await?;
    let req: UpdatePromptRequest = parse_body(&body)?;
    let input = UpdatePromptInput {
        name: req.name,
        description: req.description,
        prompt_text: req.prompt_text,
        tags: req.tags,
    };
    let prompt = service(&state).update(&id, input).await?;
    Ok(Json(PromptResponse {
        prompt: prompt.into(),
    }))
}

/// DELETE /api/admin/prompts/{id}
pub async fn delete_prompt<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> PromptResult<Json<SuccessResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    require_session(&state, &headers).await?;
    service(&state).delete(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// PATCH /api/admin/prompts/{id}/toggle-active
pub async fn toggle_prompt_active<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> PromptResult<Json<PromptResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    require_session(&state, &headers).await?;
    let req: TogglePromptActiveRequest = parse_body(&body)?;
    let prompt = service(&state).set_active(&id, req.is_active).await?;
    Ok(Json(PromptResponse {
        prompt: prompt.into(),
    }))
}

/// POST /api/admin/prompts/{id}/set-default
pub async fn set_default_prompt<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> PromptResult<Json<PromptResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    require_session(&state, &headers).await?;
    let req: SetDefaultPromptRequest = parse_body(&body)?;
    let prompt = service(&state).set_default(&id, req.kind.parse()?).await?;
    Ok(Json(PromptResponse {
        prompt: prompt.into(),
    }))
}

/// GET /api/admin/prompts/{id}/analytics
pub async fn prompt_analytics<A>(
    State(state): State<AuthAppState<A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> PromptResult<Json<PromptAnalyticsResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    require_session(&state, &headers).await?;
    let analytics = service(&state).analytics(&id).await?;
    Ok(Json(PromptAnalyticsResponse { analytics }))
}

/// GET /api/prompts/active?type=
pub async fn active_prompts<A>(
    State(state): State<AuthAppState<A>>,
    Query(query): Query<PromptTypeQuery>,
) -> PromptResult<Json<PromptsResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    let prompts = service(&state).active(required_kind(&query)?).await?;
    Ok(Json(PromptsResponse {
        prompts: prompts.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/prompts/default?type=
pub async fn default_prompt<A>(
    State(state): State<AuthAppState<A>>,
    Query(query): Query<PromptTypeQuery>,
) -> PromptResult<Json<DefaultPromptResponse>>
where
    A: Adapter + Send + Sync + 'static,
{
    let prompt = service(&state).default_for(required_kind(&query)?).await?;
    Ok(Json(DefaultPromptResponse {
        prompt: prompt.map(Into::into),
    }))
}
