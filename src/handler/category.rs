//! Category endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::database::AppState;
use crate::error::Result;
use crate::model::{CategoryRecord, CreateCategoryRequest};
use crate::store;

/// Lists all categories ordered by name, without pagination
///
/// # Response
///
/// ```json
/// [{ "id": 2, "name": "Books" }, { "id": 1, "name": "Sport" }]
/// ```
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryRecord>>> {
    Ok(Json(store::list_categories(&state.db)?))
}

/// Creates a category from `{"name": ...}`
///
/// # Response
///
/// - **201 Created** - Category created
/// - **409 Conflict** - Name already taken
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse> {
    let category = store::create_category(&state.db, payload.name)?;
    tracing::info!(id = category.id, name = %category.name, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Returns a single category
///
/// # Response
///
/// - **200 OK** - `{"id", "name"}`
/// - **404 Not Found** - Category does not exist
pub async fn get_category(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<CategoryRecord>> {
    Ok(Json(store::get_category(&state.db, id)?))
}

/// Deletes a category and every ad filed under it
///
/// # Response
///
/// - **200 OK** - `{"status": "OK"}`
/// - **404 Not Found** - Category does not exist
pub async fn delete_category(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    store::delete_category(&state.db, id)?;
    tracing::info!(id, "category deleted");
    Ok(super::status_ok())
}
