use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            DeleteUserRequest, PublicUser, RegisterRequest, TokenRequest, TokenResponse,
            UpdateUserRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::{codes, ApiError},
    state::AppState,
    validation::{is_strong_password, is_valid_email},
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/auth/token", post(issue_token))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route(
        "/users/me",
        get(get_me).patch(update_me).delete(delete_me),
    )
}

fn public(user: User) -> PublicUser {
    PublicUser {
        id: user.id,
        email: user.email,
        notifications_enabled: user.notifications_enabled,
    }
}

fn weak_password_error() -> ApiError {
    ApiError::validation(
        codes::INVALID_PASSWORD,
        "Passwords must contain at least one uppercase letter, one lowercase letter, \
         one digit, one special character, and be at least 8 characters long",
    )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "register rejected: invalid email");
        return Err(ApiError::validation(
            codes::INVALID_EMAIL,
            "Invalid email format",
        ));
    }
    if !is_strong_password(&payload.password) {
        warn!("register rejected: weak password");
        return Err(weak_password_error());
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "register rejected: email taken");
        return Err(ApiError::existing_user());
    }

    let hash = hash_password(&payload.password)?;
    // A concurrent registration can still win the race; the unique
    // constraint surfaces it as Conflict.
    let user = User::create(&state.db, &payload.email, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(public(user))))
}

#[instrument(skip(state, payload))]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(mut payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password answer identically so the response
    // leaks nothing about which occurred.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!("login failed");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login failed");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id)?;

    info!(user_id = %user.id, "access token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;
    Ok(Json(public(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "update rejected: wrong current password");
        return Err(ApiError::InvalidCredentials);
    }

    let password_hash = match payload.new_password.as_deref() {
        Some(new_password) => {
            if !is_strong_password(new_password) {
                return Err(weak_password_error());
            }
            hash_password(new_password)?
        }
        None => user.password_hash.clone(),
    };

    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err(ApiError::validation(
                    codes::INVALID_EMAIL,
                    "Invalid email format",
                ));
            }
            email
        }
        None => user.email.clone(),
    };

    let notifications_enabled = payload
        .notifications_enabled
        .unwrap_or(user.notifications_enabled);

    let updated = User::update(
        &state.db,
        user.id,
        &email,
        &password_hash,
        notifications_enabled,
    )
    .await?;

    info!(user_id = %updated.id, "user updated");
    Ok(Json(public(updated)))
}

#[instrument(skip(state, payload))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<StatusCode, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "delete rejected: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    User::delete_cascade(&state.db, user.id).await?;
    info!(user_id = %user.id, "user deleted with owned tasks");
    Ok(StatusCode::NO_CONTENT)
}
