/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account
/// - `POST /api/auth/login` - Login with username or email
/// - `GET /api/auth/me` - Current account info (bearer)
/// - `POST /api/auth/logout` - Stateless logout (bearer)
/// - `POST /api/auth/forgot-password` - Request a password reset
/// - `POST /api/auth/reset-password` - Redeem a reset token
///
/// Login failures use one message for unknown accounts and wrong
/// passwords alike, and forgot-password answers identically whether or
/// not the email exists, so neither endpoint leaks which accounts are
/// registered.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use pharmalens_shared::{
    auth::{jwt, middleware::AuthContext, password, reset},
    models::{
        password_reset_token::PasswordResetToken,
        user::{CreateUser, PublicUser, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (at least 6 characters)
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
///
/// The `username` field accepts either a username or an email address.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response for register and login: a bearer token plus the public user
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// Current-user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

/// Plain message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Forgot-password response
///
/// The token and URL appear only when `DEBUG_EXPOSE_RESET_TOKEN` is on;
/// production responses carry the generic message alone.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_url: Option<String>,
}

/// Reset-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[serde(rename = "newPassword")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// The one message both login failure modes share
const LOGIN_FAILED: &str = "Invalid username or password";

/// The one message forgot-password returns whether or not the email exists
const RESET_REQUESTED: &str =
    "If the email is registered, a password reset link will be sent to it";

/// Register a new account
///
/// Creates a user with role `user` and returns a 24-hour bearer token
/// together with the public user view.
///
/// # Errors
///
/// - `409 Conflict`: username or email already taken
/// - `400 Bad Request`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    if User::username_or_email_taken(&state.db, &req.username, &req.email).await? {
        return Err(ApiError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    // Registration can never mint an admin; that takes the seed step or
    // an explicit promotion.
    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: UserRole::User,
        },
    )
    .await?;

    let claims = jwt::Claims::new(user.id, user.username.clone(), user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "New account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user: user.into(),
        }),
    ))
}

/// Login with username or email
///
/// # Errors
///
/// - `401 Unauthorized`: unknown account or wrong password, with an
///   identical message for both
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_username_or_email(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(LOGIN_FAILED.to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
    }

    let claims = jwt::Claims::new(user.id, user.username.clone(), user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

/// Current account info
///
/// # Errors
///
/// - `404 Not Found`: the account behind the token no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { user: user.into() }))
}

/// Stateless logout
///
/// Tokens are not tracked server-side; the client discards its copy.
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// Request a password reset
///
/// Always answers with the same generic message. When the email exists,
/// a single-use token with a 1-hour expiry is persisted for it.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<ForgotPasswordResponse>> {
    req.validate()?;

    let mut response = ForgotPasswordResponse {
        message: RESET_REQUESTED.to_string(),
        reset_token: None,
        reset_url: None,
    };

    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        // Unknown email: identical response, nothing persisted.
        return Ok(Json(response));
    };

    let token = reset::generate_reset_token();
    let expires_at = reset::reset_token_expiry();

    PasswordResetToken::create(&state.db, user.id, &token, expires_at).await?;

    tracing::info!(user_id = %user.id, "Password reset token issued");

    if state.config.api.debug_expose_reset_token {
        response.reset_url = Some(state.config.reset_url(&token));
        response.reset_token = Some(token);
    }

    Ok(Json(response))
}

/// Redeem a reset token
///
/// The token must be unused and unexpired. The password hash is updated
/// first; if marking the token used fails afterwards, the password
/// change stands and the failure is only logged.
///
/// # Errors
///
/// - `400 Bad Request`: token unknown, already used, or expired
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    let token = PasswordResetToken::find_valid(&state.db, &req.token)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset token".to_string()))?;

    let password_hash = password::hash_password(&req.new_password)?;

    User::update_password(&state.db, token.user_id, &password_hash).await?;

    if let Err(e) = PasswordResetToken::mark_used(&state.db, token.id).await {
        // The password change already took effect; losing the used flag
        // is an accepted limitation.
        tracing::error!(token_id = %token.id, "Failed to mark reset token as used: {}", e);
    }

    tracing::info!(user_id = %token.user_id, "Password reset completed");

    Ok(Json(MessageResponse {
        message: "Password reset successfully. Please log in with your new password.".to_string(),
    }))
}
