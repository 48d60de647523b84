//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::{
    prompt::{Prompt, PromptAnalytics},
    session::Session,
    user::User,
};

fn default_true() -> bool {
    true
}

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub remember_me: bool,
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub remember_me: bool,
}

/// Sign up / sign in response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Session token when a session was created
    pub token: Option<String>,
    pub user: User,
}

// ============================================================================
// Session
// ============================================================================

/// `get-session` response; the endpoint answers `null` when signed out
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: Session,
    pub user: User,
}

/// Session as listed to its owner (no token)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub current: bool,
}

impl SessionSummary {
    pub fn new(session: Session, current_id: &str) -> Self {
        Self {
            current: session.id == current_id,
            id: session.id,
            expires_at: session.expires_at,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            created_at: session.created_at,
        }
    }
}

/// `{ "status": true }`
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: bool,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: true }
    }
}

// ============================================================================
// Password
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ForgetPasswordRequest {
    pub email: String,
    #[serde(default, rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
    /// May also come from the `?token=` query
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default, rename = "callbackURL")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    #[serde(default)]
    pub revoke_other_sessions: bool,
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Profile fields shown on the account page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image: user.image,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ============================================================================
// Application endpoints
// ============================================================================

/// `{ "user": ... }` with `null` when signed out
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserResponse {
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest {
    /// Must match the signed-in user when present
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub provider: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvidersResponse {
    pub ok: bool,
    pub providers: Vec<String>,
}

impl ProvidersResponse {
    pub fn new(providers: Vec<String>) -> Self {
        Self { ok: true, providers }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevLoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Prompts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromptRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub prompt_text: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Flags in the body are ignored; they have their own routes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePromptRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TogglePromptActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetDefaultPromptRequest {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptTypeQuery {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Prompt as the web app reads it: timestamps in epoch milliseconds
#[derive(Debug, Clone, Serialize)]
pub struct PromptView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub prompt_text: String,
    pub is_active: bool,
    pub is_default: bool,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: Option<String>,
}

impl From<Prompt> for PromptView {
    fn from(prompt: Prompt) -> Self {
        Self {
            id: prompt.id,
            name: prompt.name,
            description: prompt.description,
            kind: prompt.kind.as_str().to_string(),
            prompt_text: prompt.prompt_text,
            is_active: prompt.is_active,
            is_default: prompt.is_default,
            tags: prompt.tags,
            created_at: prompt.created_at.timestamp_millis(),
            updated_at: prompt.updated_at.timestamp_millis(),
            created_by: prompt.created_by,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptResponse {
    pub prompt: PromptView,
}

/// `prompt` is null when the kind has no default
#[derive(Debug, Clone, Serialize)]
pub struct DefaultPromptResponse {
    pub prompt: Option<PromptView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptsResponse {
    pub prompts: Vec<PromptView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptAnalyticsResponse {
    pub analytics: PromptAnalytics,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_in_remember_me_defaults_to_true() {
        let req: SignInRequest =
            serde_json::from_value(json!({ "email": "a@b.co", "password": "x" })).unwrap();
        assert!(req.remember_me);

        let req: SignInRequest = serde_json::from_value(
            json!({ "email": "a@b.co", "password": "x", "rememberMe": false }),
        )
        .unwrap();
        assert!(!req.remember_me);
    }

    #[test]
    fn test_renamed_fields() {
        let req: ForgetPasswordRequest =
            serde_json::from_value(json!({ "email": "a@b.co", "redirectTo": "/reset" })).unwrap();
        assert_eq!(req.redirect_to.as_deref(), Some("/reset"));

        let query: CallbackQuery =
            serde_json::from_value(json!({ "callbackURL": "/auth/reset-password" })).unwrap();
        assert_eq!(query.callback_url.as_deref(), Some("/auth/reset-password"));

        let req: ProviderRequest =
            serde_json::from_value(json!({ "userId": "user:a", "provider": "github" })).unwrap();
        assert_eq!(req.user_id.as_deref(), Some("user:a"));
    }

    #[test]
    fn test_prompt_requests_use_snake_case() {
        let req: CreatePromptRequest = serde_json::from_value(json!({
            "name": "Summary",
            "type": "analysis",
            "prompt_text": "Summarize this",
        }))
        .unwrap();
        assert_eq!(req.kind, "analysis");
        assert!(req.tags.is_none());

        let req: UpdatePromptRequest =
            serde_json::from_value(json!({ "id": "ai_prompt:a", "is_active": true })).unwrap();
        assert!(req.name.is_none() && req.prompt_text.is_none());
    }
}
