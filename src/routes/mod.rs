pub mod admin;
pub mod categories;
pub mod items;

use axum::Router;

use crate::state::AppState;

/// The full API surface. `main` adds the middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(categories::router())
        .merge(items::router())
        .merge(admin::router())
}
