//! Auth Router

use axum::{
    Router,
    middleware,
    routing::{get, patch, post},
};

use crate::domain::adapter::Adapter;
use crate::presentation::app_handlers;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_user;
use crate::presentation::prompt_handlers;

/// Library endpoints, to be nested under `/api/auth`
pub fn auth_router<A>(state: AuthAppState<A>) -> Router
where
    A: Adapter + Send + Sync + 'static,
{
    Router::new()
        .route("/sign-up/email", post(handlers::sign_up::<A>))
        .route("/sign-in/email", post(handlers::sign_in::<A>))
        .route("/sign-out", post(handlers::sign_out::<A>))
        .route("/get-session", get(handlers::get_session::<A>))
        .route("/list-sessions", get(handlers::list_sessions::<A>))
        .route("/revoke-other-sessions", post(handlers::revoke_other_sessions::<A>))
        .route("/forget-password", post(handlers::forget_password::<A>))
        .route("/reset-password", post(handlers::reset_password::<A>))
        .route("/reset-password/{token}", get(handlers::reset_password_callback::<A>))
        .route("/change-password", post(handlers::change_password::<A>))
        .route("/update-user", post(handlers::update_user::<A>))
        .route("/delete-user", post(handlers::delete_user::<A>))
        // application endpoints sharing the prefix
        .route("/session", get(app_handlers::current_user::<A>))
        .route("/reset-request", post(app_handlers::reset_request::<A>))
        .route("/provider/link", post(app_handlers::link_provider::<A>))
        .route("/provider/unlink", post(app_handlers::unlink_provider::<A>))
        .route("/provider/list", get(app_handlers::list_providers::<A>))
        .with_state(state)
}

/// Pages that require a signed-in user, mounted at `/user`
pub fn user_router<A>(state: AuthAppState<A>) -> Router
where
    A: Adapter + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/profile",
            get(app_handlers::get_profile::<A>).post(app_handlers::update_profile::<A>),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user::<A>))
        .with_state(state)
}

/// Prompt administration and the public prompt reads
pub fn prompt_router<A>(state: AuthAppState<A>) -> Router
where
    A: Adapter + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/api/admin/prompts",
            get(prompt_handlers::list_prompts::<A>).post(prompt_handlers::create_prompt::<A>),
        )
        .route(
            "/api/admin/prompts/{id}",
            get(prompt_handlers::get_prompt::<A>)
                .put(prompt_handlers::update_prompt::<A>)
                .delete(prompt_handlers::delete_prompt::<A>),
        )
        .route(
            "/api/admin/prompts/{id}/toggle-active",
            patch(prompt_handlers::toggle_prompt_active::<A>),
        )
        .route(
            "/api/admin/prompts/{id}/set-default",
            post(prompt_handlers::set_default_prompt::<A>),
        )
        .route(
            "/api/admin/prompts/{id}/analytics",
            get(prompt_handlers::prompt_analytics::<A>),
        )
        .route("/api/prompts/active", get(prompt_handlers::active_prompts::<A>))
        .route("/api/prompts/default", get(prompt_handlers::default_prompt::<A>))
        .with_state(state)
}

/// Every route of the application
pub fn app_router<A>(state: AuthAppState<A>) -> Router
where
    A: Adapter + Send + Sync + 'static,
{
    Router::new()
        .route("/api/dev-login", post(app_handlers::dev_login::<A>))
        .route("/auth/logout", post(app_handlers::logout::<A>))
        .with_state(state.clone())
        .nest("/api/auth", auth_router(state.clone()))
        .nest("/user", user_router(state.clone()))
        .merge(prompt_router(state))
}
