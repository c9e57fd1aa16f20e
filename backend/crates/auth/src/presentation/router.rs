//! Auth Router

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use platform::rate_limit::KeyValueStore;

use crate::domain::repository::UserRepository;
use crate::infra::mailer::Mailer;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_auth;

/// Create the Auth router; nest it under `/api`
pub fn auth_router<U, S, M>(state: AuthAppState<U, S, M>) -> Router
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let protected = Router::new()
        .route("/user-info", get(handlers::user_info))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<U, S, M>,
        ));

    Router::new()
        .route("/user-registration", post(handlers::user_registration::<U, S, M>))
        .route("/verify-user", post(handlers::verify_user::<U, S, M>))
        .route("/resend-otp", post(handlers::resend_otp::<U, S, M>))
        .route("/user-login", post(handlers::user_login::<U, S, M>))
        .route("/refresh-token", post(handlers::refresh_token::<U, S, M>))
        .route(
            "/user-forgot-password",
            post(handlers::user_forgot_password::<U, S, M>),
        )
        .route(
            "/verify-user-forgot-password",
            post(handlers::verify_user_forgot_password::<U, S, M>),
        )
        .route(
            "/user-reset-password",
            post(handlers::user_reset_password::<U, S, M>),
        )
        .merge(protected)
        .with_state(state)
}
