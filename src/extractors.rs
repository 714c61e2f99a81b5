use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use rusqlite::params;

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated admin behind a request.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin_id: String,
    pub email: String,
}

/// Extractor that requires a valid admin session cookie.
/// The join against `admins` makes the authority check live: an admin whose
/// record was deleted is rejected even while their session row exists.
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token_from_headers(&parts.headers, &state.config.auth.cookie_name)
            .ok_or(AppError::Unauthorized)?;

        let conn = state.db.get()?;
        conn.query_row(
            "SELECT a.id, a.email FROM sessions s \
             JOIN admins a ON a.id = s.admin_id \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(AdminSession {
                    admin_id: row.get(0)?,
                    email: row.get(1)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::Unauthorized,
            e => AppError::from(e),
        })
    }
}

/// Optional admin extractor: returns None instead of 401 when the caller is
/// anonymous. Read paths use this to decide whether hidden items are shown.
/// Only missing credentials are swallowed; a failing database still errors.
pub struct MaybeAdmin(pub Option<AdminSession>);

impl FromRequestParts<AppState> for MaybeAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AdminSession::from_request_parts(parts, state).await {
            Ok(admin) => Ok(MaybeAdmin(Some(admin))),
            Err(AppError::Unauthorized) => Ok(MaybeAdmin(None)),
            Err(e) => Err(e),
        }
    }
}

pub fn session_token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == cookie_name {
                Some(val.to_string())
            } else {
                None
            }
        })
}
