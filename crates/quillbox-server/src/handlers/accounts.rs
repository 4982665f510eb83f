use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde::Deserialize;
use serde_json::Value;

use crate::crypto::{self, PBKDF2_ITERATIONS, SALT_LEN};
use crate::error::AppError;
use crate::handlers::auth::authenticate;
use crate::state::AppState;
use crate::token::AUTH_COOKIE;
use crate::util::{now_ts, random_bytes, ts_to_rfc3339, uuid_v4};

use entity::user;

fn profile_json(u: &user::Model) -> Value {
    serde_json::json!({
        "id": u.id,
        "email": u.email,
        "name": u.name,
        "createdAt": ts_to_rfc3339(u.created_at),
    })
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{AUTH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterData {
    email: String,
    name: Option<String>,
    password: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterData>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Email is invalid".to_string()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password cannot be blank".to_string()));
    }
    if let Some(ref name) = payload.name {
        if name.len() > 50 {
            return Err(AppError::Validation(
                "Name must be at most 50 characters".to_string(),
            ));
        }
    }

    let now = now_ts();
    let salt = random_bytes(SALT_LEN);
    let hash = crypto::hash_password(payload.password.as_bytes(), &salt, PBKDF2_ITERATIONS);

    let active = user::ActiveModel {
        id: Set(uuid_v4()),
        email: Set(email.clone()),
        name: Set(payload.name.unwrap_or_else(|| email.clone())),
        password_hash: Set(hash),
        salt: Set(salt),
        password_iterations: Set(PBKDF2_ITERATIONS as i32),
        created_at: Set(now),
        updated_at: Set(now),
    };

    // The unique index on email is the authority on duplicates.
    let created = match active.insert(&state.db).await {
        Ok(u) => u,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((StatusCode::CREATED, Json(profile_json(&created))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    email: String,
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginData>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password must be indistinguishable.
    let Some(u) = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
    else {
        return Err(AppError::Unauthorized);
    };

    if !crypto::verify_password(
        payload.password.as_bytes(),
        &u.salt,
        &u.password_hash,
        u.password_iterations as u32,
    ) {
        return Err(AppError::Unauthorized);
    }

    let token = state.tokens.issue(&u.id, &u.email)?;
    let cookie = session_cookie(&token, state.config.token_ttl_secs);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(profile_json(&u)),
    ))
}

pub async fn logout() -> impl IntoResponse {
    // Expire the cookie immediately; the token itself simply ages out.
    let cookie = session_cookie("", 0);

    ([(header::SET_COOKIE, cookie)], Json(serde_json::json!({ "ok": true })))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let auth = authenticate(&state, &headers)?;

    // Token claims may outlive the account; a vanished user is treated as
    // unauthenticated.
    let Some(u) = user::Entity::find_by_id(auth.user_id).one(&state.db).await? else {
        return Err(AppError::Unauthorized);
    };

    Ok(Json(profile_json(&u)))
}
