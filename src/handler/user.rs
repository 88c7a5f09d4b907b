//! User endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::database::AppState;
use crate::error::Result;
use crate::model::{CreateUserRequest, ListParams, PageResponse, UpdateUserRequest, UserView};
use crate::store;

/// Lists users ordered by username, paginated like ads
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse<UserView>>> {
    let page = store::list_users(&state.db, state.config.total_on_page, params.page.as_deref())?;
    Ok(Json(page.map(UserView::from)))
}

/// Creates a user, creating any named location that does not exist yet
///
/// # Request Body
///
/// ```json
/// {
///   "username": "alice",
///   "first_name": "Alice",
///   "last_name": "Liddell",
///   "role": "member",
///   "password": "secret",
///   "age": 30,
///   "locations": ["Moscow"]
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - User created
/// - **409 Conflict** - Username already taken
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    let row = store::create_user(&state.db, payload)?;
    tracing::info!(id = row.user.id, username = %row.user.username, "user created");
    Ok((StatusCode::CREATED, Json(UserView::from(row))))
}

/// Returns a single user with their locations and published ad count
///
/// # Response
///
/// - **200 OK** - User projection
/// - **404 Not Found** - User does not exist
pub async fn get_user(Path(id): Path<u64>, State(state): State<AppState>) -> Result<Json<UserView>> {
    let row = store::get_user(&state.db, id)?;
    Ok(Json(row.into()))
}

/// Updates the fields present in the body
///
/// Locations in the body are added to the user's set; existing ones stay.
/// `first_name` / `last_name` set to `null` clear the stored name, while a
/// missing key keeps it.
///
/// # Response
///
/// - **200 OK** - Updated user projection
/// - **404 Not Found** - User does not exist
pub async fn update_user(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserView>> {
    let row = store::update_user(&state.db, id, payload)?;
    tracing::info!(id, "user updated");
    Ok(Json(row.into()))
}

/// Deletes a user and every ad they own
///
/// # Response
///
/// - **200 OK** - `{"status": "OK"}`
/// - **404 Not Found** - User does not exist
pub async fn delete_user(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    store::delete_user(&state.db, id)?;
    tracing::info!(id, "user deleted");
    Ok(super::status_ok())
}
