//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::response::{AppendHeaders, IntoResponse};
use http::{HeaderMap, StatusCode, header};
use platform::cookie::extract_cookie;
use platform::rate_limit::KeyValueStore;

use crate::application::config::AuthConfig;
use crate::application::{
    ForgotPasswordUseCase, OtpService, RefreshQueue, RefreshUseCase, RegisterInput,
    RegisterUseCase, ResetPasswordInput, ResetPasswordUseCase, SignInInput, SignInUseCase,
    TokenIssuer, VerifyUserInput, VerifyUserUseCase,
};
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;
use crate::infra::mailer::Mailer;
use crate::presentation::dto::{
    EmailRequest, LoginRequest, LoginResponse, LoginUser, MessageResponse, RegistrationRequest,
    ResetPasswordRequest, UserInfoResponse, UserProfile, VerifyForgotPasswordRequest,
    VerifyUserRequest,
};
use crate::presentation::middleware::AuthenticatedUser;

/// Shared state for auth handlers
pub struct AuthAppState<U, S, M>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    pub users: Arc<U>,
    pub otp: Arc<OtpService<S, M>>,
    pub tokens: Arc<TokenIssuer>,
    pub refresh_queue: Arc<RefreshQueue>,
    pub config: Arc<AuthConfig>,
}

// Manual impl: the derive would require `U: Clone` etc.
impl<U, S, M> Clone for AuthAppState<U, S, M>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            otp: self.otp.clone(),
            tokens: self.tokens.clone(),
            refresh_queue: self.refresh_queue.clone(),
            config: self.config.clone(),
        }
    }
}

impl<U, S, M> AuthAppState<U, S, M>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    pub fn new(users: U, store: S, mailer: M, config: AuthConfig) -> Self {
        let otp = OtpService::new(Arc::new(store), Arc::new(mailer), config.otp.clone());
        Self {
            users: Arc::new(users),
            otp: Arc::new(otp),
            tokens: Arc::new(TokenIssuer::new(&config)),
            refresh_queue: Arc::new(RefreshQueue::new()),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

/// POST /api/user-registration
pub async fn user_registration<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case = RegisterUseCase::new(state.users.clone(), state.otp.clone());

    use_case
        .execute(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(MessageResponse::ok(
        "OTP sent to email. Please verify your account.",
    )))
}

/// POST /api/verify-user
pub async fn verify_user<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    payload: Result<Json<VerifyUserRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case =
        VerifyUserUseCase::new(state.users.clone(), state.otp.clone(), state.config.clone());

    use_case
        .execute(VerifyUserInput {
            name: req.name,
            email: req.email,
            password: req.password,
            otp: req.otp,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("User registered successfully.")),
    ))
}

/// POST /api/resend-otp
pub async fn resend_otp<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case = RegisterUseCase::new(state.users.clone(), state.otp.clone());
    use_case.resend(&req.email).await?;

    Ok(Json(MessageResponse::ok(
        "OTP sent to email, Please verify your account.",
    )))
}

// ============================================================================
// Session
// ============================================================================

/// POST /api/user-login
pub async fn user_login<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case =
        SignInUseCase::new(state.users.clone(), state.tokens.clone(), state.config.clone());

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            state
                .config
                .refresh_cookie()
                .build_set_cookie(&output.tokens.refresh_token),
        ),
        (
            header::SET_COOKIE,
            state
                .config
                .access_cookie()
                .build_set_cookie(&output.tokens.access_token),
        ),
    ]);

    Ok((
        cookies,
        Json(LoginResponse {
            success: true,
            message: "Logged in successfully.",
            user: LoginUser::from(&output.user),
        }),
    ))
}

/// POST /api/refresh-token
pub async fn refresh_token<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let token = extract_cookie(&headers, &state.config.refresh_cookie_name);

    let use_case = RefreshUseCase::new(
        state.users.clone(),
        state.tokens.clone(),
        state.refresh_queue.clone(),
    );
    let access_token = use_case.execute(token.as_deref()).await?;

    Ok((
        [(
            header::SET_COOKIE,
            state.config.access_cookie().build_set_cookie(&access_token),
        )],
        Json(MessageResponse::ok("Access token refreshed.")),
    ))
}

/// GET /api/user-info
pub async fn user_info(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
    Json(UserInfoResponse {
        success: true,
        user: UserProfile::from(&user.0),
    })
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/user-forgot-password
pub async fn user_forgot_password<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case = ForgotPasswordUseCase::new(state.users.clone(), state.otp.clone());
    use_case.request(&req.email).await?;

    Ok(Json(MessageResponse::ok(
        "OTP sent to email, Please verify your account.",
    )))
}

/// POST /api/verify-user-forgot-password
pub async fn verify_user_forgot_password<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    payload: Result<Json<VerifyForgotPasswordRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case = ForgotPasswordUseCase::new(state.users.clone(), state.otp.clone());
    use_case.verify(&req.email, &req.otp).await?;

    Ok(Json(MessageResponse::ok(
        "OTP verified. Please reset your account password.",
    )))
}

/// POST /api/user-reset-password
pub async fn user_reset_password<U, S, M>(
    State(state): State<AuthAppState<U, S, M>>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    U: UserRepository + Sync + 'static,
    S: KeyValueStore + Sync + 'static,
    M: Mailer + Sync + 'static,
{
    let Json(req) = payload?;
    let use_case =
        ResetPasswordUseCase::new(state.users.clone(), state.otp.clone(), state.config.clone());

    use_case
        .execute(ResetPasswordInput {
            email: req.email,
            new_password: req.new_password,
        })
        .await?;

    Ok(Json(MessageResponse::ok("Password reset successful.")))
}
