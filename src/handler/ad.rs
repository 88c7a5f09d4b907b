//! Ad endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::database::AppState;
use crate::error::{Error, Result};
use crate::media;
use crate::model::{AdView, CreateAdRequest, ListParams, PageResponse, UpdateAdRequest};
use crate::store;

/// Lists ads, most expensive first
///
/// # Query Parameters
///
/// - `page` (optional) - Page number; missing or non-numeric means 1,
///   out-of-range means the last page
///
/// # Response
///
/// ```json
/// { "items": [...], "total": 42, "per_page": 5 }
/// ```
pub async fn list_ads(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PageResponse<AdView>>> {
    let page = store::list_ads(&state.db, state.config.total_on_page, params.page.as_deref())?;
    let media_url = &state.config.media_url;
    Ok(Json(page.map(|row| AdView::new(row, media_url))))
}

/// Creates an ad
///
/// # Response
///
/// - **201 Created** - Ad created
/// - **404 Not Found** - Author or category does not exist
pub async fn create_ad(
    State(state): State<AppState>,
    Json(payload): Json<CreateAdRequest>,
) -> Result<impl IntoResponse> {
    let row = store::create_ad(&state.db, payload)?;
    tracing::info!(id = row.ad.id, author = %row.author, "ad created");

    Ok((
        StatusCode::CREATED,
        Json(AdView::new(row, &state.config.media_url)),
    ))
}

/// Returns a single ad
///
/// # Path Parameters
///
/// - `id` - Ad id
///
/// # Response
///
/// - **200 OK** - Ad projection
/// - **404 Not Found** - Ad does not exist
pub async fn get_ad(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<AdView>> {
    let row = store::get_ad(&state.db, id)?;
    Ok(Json(AdView::new(row, &state.config.media_url)))
}

/// Updates the fields present in the body; author and category are fixed
///
/// # Request Body
///
/// Any subset of `name`, `price`, `description`, `is_published`.
///
/// # Response
///
/// - **200 OK** - Updated ad projection
/// - **404 Not Found** - Ad does not exist
pub async fn update_ad(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateAdRequest>,
) -> Result<Json<AdView>> {
    let row = store::update_ad(&state.db, id, payload)?;
    tracing::info!(id, "ad updated");
    Ok(Json(AdView::new(row, &state.config.media_url)))
}

/// Deletes an ad
///
/// # Response
///
/// - **200 OK** - `{"status": "OK"}`
/// - **404 Not Found** - Ad does not exist
pub async fn delete_ad(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    store::delete_ad(&state.db, id)?;
    tracing::info!(id, "ad deleted");
    Ok(super::status_ok())
}

/// Attaches an image from the multipart field `image`
///
/// # Response
///
/// - **200 OK** - Ad projection with the image URL
/// - **400 Bad Request** - No `image` file in the form
/// - **404 Not Found** - Ad does not exist
pub async fn upload_image(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AdView>> {
    // Fail before touching the disk if the ad is gone
    store::get_ad(&state.db, id)?;

    let mut stored = None;
    while let Some(field) = multipart.next_field().await? {
        // Only a file part counts; a plain text `image` value is skipped
        let file_name = match (field.name(), field.file_name()) {
            (Some("image"), Some(file_name)) => file_name.to_string(),
            _ => continue,
        };
        let data = field.bytes().await?;
        stored = Some(media::save_image(&state.config.media_root, &file_name, &data).await?);
        break;
    }

    let path = stored.ok_or_else(|| Error::BadRequest("missing 'image' file field".into()))?;
    let row = store::set_ad_image(&state.db, id, path)?;
    tracing::info!(id, image = ?row.ad.image, "ad image attached");

    Ok(Json(AdView::new(row, &state.config.media_url)))
}
