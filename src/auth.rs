use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use libsql::Connection;
use password_hash::rand_core::OsRng;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::constants::*;
use crate::errors::ServiceError;
use crate::extract::ValidJson;
use crate::models::{LoginPayload, LoginResponse, PublicUser, RegisterPayload, User};
use crate::utils::{db_error, db_error_with_context};
use crate::{AppState, Db};

/// The caller identified by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServiceError::Unauthorized(ERR_UNAUTHORIZED.to_string()))?
            .to_string();

        let user = find_user_by_token(&state.db, &token)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(ERR_INVALID_TOKEN.to_string()))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            token,
        })
    }
}

async fn find_user_by_token(db: &Db, token: &str) -> Result<Option<PublicUser>, ServiceError> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT users.id, users.name FROM auth_tokens JOIN users ON users.id = auth_tokens.user_id WHERE auth_tokens.token = ?",
            [token],
        )
        .await
        .map_err(|_| db_error_with_context("failed to look up token"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => Ok(Some(PublicUser {
            id: row.get(0).map_err(|_| db_error())?,
            username: row.get(1).map_err(|_| db_error())?,
        })),
        None => Ok(None),
    }
}

async fn find_user_by_name(conn: &Connection, username: &str) -> Result<Option<User>, ServiceError> {
    let mut rows = conn
        .query(
            "SELECT id, name, password_hash FROM users WHERE name = ?",
            [username],
        )
        .await
        .map_err(|_| db_error_with_context("failed to look up user"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => Ok(Some(User {
            id: row.get(0).map_err(|_| db_error())?,
            username: row.get(1).map_err(|_| db_error())?,
            password_hash: row.get(2).map_err(|_| db_error())?,
        })),
        None => Ok(None),
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), ServiceError> {
    let username_len = username.trim().chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username_len) {
        return Err(ServiceError::BadRequest(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub async fn register(
    State(app_state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterPayload>,
) -> Result<(StatusCode, Json<PublicUser>), ServiceError> {
    validate_credentials(&payload.username, &payload.password)?;
    let username = payload.username.trim().to_string();

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|_| db_error_with_context("failed to hash password"))?
        .to_string();

    // Lookup and insert under one write lock
    let conn = app_state.db.write().await;
    if find_user_by_name(&conn, &username).await?.is_some() {
        return Err(ServiceError::Conflict("Username already exists".to_string()));
    }

    let user_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users (id, name, password_hash) VALUES (?, ?, ?)",
        (user_id.as_str(), username.as_str(), password_hash.as_str()),
    )
    .await
    .map_err(|_| db_error_with_context("user creation failed"))?;

    tracing::info!(user_id = %user_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            id: user_id,
            username,
        }),
    ))
}

pub async fn login(
    State(app_state): State<AppState>,
    ValidJson(payload): ValidJson<LoginPayload>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let invalid = || ServiceError::Unauthorized("Invalid username or password".to_string());

    let user = {
        let conn = app_state.db.read().await;
        find_user_by_name(&conn, payload.username.trim())
            .await?
            .ok_or_else(invalid)?
    };

    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| invalid())?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    let token = Uuid::new_v4().to_string();
    let issued_at = OffsetDateTime::now_utc().unix_timestamp();
    let conn = app_state.db.write().await;
    conn.execute(
        "INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)",
        (token.as_str(), user.id.as_str(), issued_at),
    )
    .await
    .map_err(|_| db_error_with_context("failed to issue token"))?;

    Ok(Json(LoginResponse {
        token,
        user: PublicUser {
            id: user.id,
            username: user.username,
        },
    }))
}

pub async fn me(user: AuthUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.id,
        username: user.username,
    })
}

pub async fn logout(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    let conn = app_state.db.write().await;
    conn.execute("DELETE FROM auth_tokens WHERE token = ?", [user.token.as_str()])
        .await
        .map_err(|_| db_error_with_context("failed to revoke token"))?;
    Ok(StatusCode::NO_CONTENT)
}
