use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{admins, session};
use crate::content::items;
use crate::db::models::ItemType;
use crate::error::{AppError, AppResult};
use crate::extractors::{session_token_from_headers, MaybeAdmin};
use crate::state::AppState;

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddAdminRequest {
    email: String,
    password: String,
}

/// POST /admin/session: credentials login. The failure response carries no
/// detail about which field was wrong.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let Some(admin) = admins::authenticate(&state.db, &req.email, &req.password)? else {
        return Err(AppError::Unauthorized);
    };

    let hours = state.config.auth.session_hours;
    let token = session::create_session(&state.db, &admin.id, hours)?;
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        state.config.auth.cookie_name,
        token,
        hours * 3600
    );

    tracing::info!("Admin {} signed in", admin.email);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "ok": true })),
    )
        .into_response())
}

/// DELETE /admin/session: sign-out. Idempotent: an unknown or absent token
/// still clears the cookie.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = session_token_from_headers(&headers, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, &token)?;
    }

    let cookie = format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        state.config.auth.cookie_name
    );
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "ok": true })),
    )
        .into_response())
}

fn action_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": message }))).into_response()
}

/// POST /admin/visibility/{type}/{id}: flip an item's moderation flag.
async fn toggle_visibility(
    State(state): State<AppState>,
    admin: MaybeAdmin,
    Path((type_segment, id)): Path<(String, String)>,
) -> Response {
    if admin.0.is_none() {
        return action_error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let Some(item_type) = ItemType::from_param(&type_segment) else {
        return action_error(StatusCode::NOT_FOUND, "Not found");
    };

    match items::toggle_visibility(&state.db, item_type, &id) {
        Ok(visible) => Json(json!({ "ok": true, "visible": visible })).into_response(),
        Err(AppError::NotFound) => action_error(StatusCode::NOT_FOUND, "Not found"),
        Err(e) => e.into_response(),
    }
}

/// POST /admin/admins: create another admin account.
async fn add_admin(
    State(state): State<AppState>,
    admin: MaybeAdmin,
    Json(req): Json<AddAdminRequest>,
) -> Response {
    if admin.0.is_none() {
        return action_error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    match admins::add_admin(&state.db, &req.email, &req.password) {
        Ok(created) => {
            tracing::info!("Admin account {} created", created.email);
            Json(json!({ "ok": true })).into_response()
        }
        Err(AppError::Validation(msg)) => action_error(StatusCode::BAD_REQUEST, &msg),
        Err(AppError::Conflict(msg)) => action_error(StatusCode::CONFLICT, &msg),
        Err(e) => e.into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/session", post(login).delete(logout))
        .route("/admin/visibility/{type}/{id}", post(toggle_visibility))
        .route("/admin/admins", post(add_admin))
}
