use axum::http::{header, HeaderMap};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;
use crate::token::{Claims, AUTH_COOKIE};

/// Identity resolved from a verified session token.
pub struct AuthIdentity {
    pub user_id: String,
    pub email: String,
}

/// Pull the session token out of the `Cookie` header.
pub fn extract_auth_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for pair in raw.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        if name.trim() != AUTH_COOKIE {
            continue;
        }

        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        return Some(value.to_string());
    }

    None
}

/// Resolve the caller's identity from the session cookie.
///
/// A missing cookie and a malformed, tampered, or expired token all
/// collapse into the same `Unauthorized` rejection; the precise reason is
/// logged and nothing else. No database access happens here.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthIdentity, AppError> {
    let Some(token) = extract_auth_cookie(headers) else {
        return Err(AppError::Unauthorized);
    };

    match state.tokens.verify(&token) {
        Ok(Claims { sub, email, .. }) => Ok(AuthIdentity {
            user_id: sub,
            email,
        }),
        Err(e) => {
            debug!("Rejected session token: {e}");
            Err(AppError::Unauthorized)
        }
    }
}
