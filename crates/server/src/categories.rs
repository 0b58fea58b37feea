//! Category API endpoints. Categories are global, so any logged in user may
//! add or rename them.

use api_types::category::{CategoryInput, CategoryView};
use axum::{
    Json,
    extract::{Path, State},
};
use engine::Category;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
    }
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state.engine.categories().await?;
    Ok(Json(categories.into_iter().map(view).collect()))
}

/// Return the category with this name, creating it when missing.
pub async fn category_new(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryInput>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.add_category(&payload.name).await?;
    Ok(Json(view(category)))
}

pub async fn rename(
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryInput>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .rename_category(category_id, &payload.name)
        .await?;
    Ok(Json(view(category)))
}
