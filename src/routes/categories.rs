use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::content::categories;
use crate::db::models::Category;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(categories::list_categories(&state.db)?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Category>> {
    let category = categories::get_category_by_slug(&state.db, &slug)?
        .ok_or_else(|| AppError::CategoryNotFound(slug))?;
    Ok(Json(category))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{slug}", get(get_category))
}
