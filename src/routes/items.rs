use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::content::items::{self, ListFilter, NewItem};
use crate::db::models::{Item, ItemType, SortKey};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeAdmin;
use crate::state::AppState;

#[derive(Deserialize, Default)]
struct ListParams {
    category: Option<String>,
    q: Option<String>,
    sort: Option<SortKey>,
}

fn parse_type(segment: &str) -> AppResult<ItemType> {
    ItemType::from_param(segment).ok_or(AppError::NotFound)
}

/// Trusted submission path. The public site fronts this with its own forms.
async fn create_item(
    State(state): State<AppState>,
    Path(type_segment): Path<String>,
    Json(new): Json<NewItem>,
) -> AppResult<impl IntoResponse> {
    let item_type = parse_type(&type_segment)?;
    let item = items::create(&state.db, item_type, &new)?;
    tracing::info!("Created {} {} ({})", type_segment, item.id, item.title);
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items(
    State(state): State<AppState>,
    admin: MaybeAdmin,
    Path(type_segment): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Item>>> {
    let item_type = parse_type(&type_segment)?;
    let filter = ListFilter {
        category_slug: params.category,
        search: params.q,
        sort: params.sort.unwrap_or_default(),
    };
    let items = items::list(&state.db, item_type, &filter, admin.0.is_some())?;
    Ok(Json(items))
}

async fn get_item(
    State(state): State<AppState>,
    admin: MaybeAdmin,
    Path((type_segment, id)): Path<(String, String)>,
) -> AppResult<Json<Item>> {
    let item_type = parse_type(&type_segment)?;
    let item = items::get_by_id(&state.db, item_type, &id, admin.0.is_some())?
        .ok_or(AppError::NotFound)?;
    Ok(Json(item))
}

/// Unauthenticated and uncapped: every call counts.
async fn upvote_item(
    State(state): State<AppState>,
    Path((type_segment, id)): Path<(String, String)>,
) -> AppResult<Json<serde_json::Value>> {
    let item_type = parse_type(&type_segment)?;
    let upvotes = items::upvote(&state.db, item_type, &id)?;
    Ok(Json(serde_json::json!({ "upvotes": upvotes })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/{type}", post(create_item).get(list_items))
        .route("/items/{type}/{id}", get(get_item))
        .route("/items/{type}/{id}/upvote", post(upvote_item))
}
