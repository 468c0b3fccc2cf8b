/// Node palette endpoint
///
/// Serves the registry's templates in display order so a client can render the sidebar.

use crate::{api::AppState, workflow::registry::NodeTemplate};
use axum::{extract::State, response::Json, routing::get, Router};

pub fn create_palette_routes() -> Router<AppState> {
    Router::new().route("/api/palette", get(list_templates))
}

/// GET /api/palette
async fn list_templates(State(state): State<AppState>) -> Json<Vec<NodeTemplate>> {
    Json(state.registry.templates().to_vec())
}
