//! Auth Middleware
//!
//! Middleware for requiring authentication on protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::{extract_bearer_token, extract_cookie};
use platform::rate_limit::KeyValueStore;

use crate::application::UserInfoUseCase;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::AuthError;
use crate::infra::mailer::Mailer;
use crate::presentation::handlers::AuthAppState;

/// The signed-in user, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Middleware that requires a valid access token
///
/// The token is read from the access cookie, falling back to an
/// `Authorization: Bearer` header.
pub async fn require_auth<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let headers = req.headers();
    let token = extract_cookie(headers, &state.config.access_cookie_name)
        .or_else(|| extract_bearer_token(headers));

    let use_case = UserInfoUseCase::new(state.users.clone(), state.tokens.clone());
    let user = use_case.execute(token.as_deref()).await?;

    req.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(req).await)
}
