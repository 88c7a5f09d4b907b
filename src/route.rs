//! Route definitions for the classifieds API
//!
//! Paths keep the trailing-slash layout existing clients already call.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::database::AppState;
use crate::handler::{self, ad, category, user};

/// Creates the Axum router with every route configured
///
/// # Route Definitions
///
/// - `GET /ad/`, `POST /ad/create/`, `GET /ad/{id}/`, `PATCH /ad/{id}/update/`,
///   `DELETE /ad/{id}/delete/`, `POST /ad/{id}/upload_image/`
/// - `GET /user/`, `POST /user/create/`, `GET /user/{id}/`,
///   `PATCH /user/{id}/update/`, `DELETE /user/{id}/delete/`
/// - `GET /cat/`, `POST /cat/create/`, `GET /cat/{id}/`, `DELETE /cat/{id}/delete/`
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use classifieds::config::Config;
/// # use classifieds::database::{init_db, AppState};
/// # use classifieds::route::create_app;
/// # let db = init_db("data.db").unwrap();
/// let state = AppState { db: Arc::new(db), config: Arc::new(Config::default()) };
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(handler::index))
        // Ads
        .route("/ad/", get(ad::list_ads))
        .route("/ad/create/", post(ad::create_ad))
        .route("/ad/{id}/", get(ad::get_ad))
        .route("/ad/{id}/update/", patch(ad::update_ad))
        .route("/ad/{id}/delete/", delete(ad::delete_ad))
        .route(
            "/ad/{id}/upload_image/",
            post(ad::upload_image).layer(upload_limit),
        )
        // Users
        .route("/user/", get(user::list_users))
        .route("/user/create/", post(user::create_user))
        .route("/user/{id}/", get(user::get_user))
        .route("/user/{id}/update/", patch(user::update_user))
        .route("/user/{id}/delete/", delete(user::delete_user))
        // Categories
        .route("/cat/", get(category::list_categories))
        .route("/cat/create/", post(category::create_category))
        .route("/cat/{id}/", get(category::get_category))
        .route("/cat/{id}/delete/", delete(category::delete_category))
        .with_state(state)
}
