//! Data models for the classifieds service
//!
//! Rows stored in the database, request payloads, and the JSON projections
//! returned by the handlers.

use serde::{Deserialize, Deserializer, Serialize};

/// A named place users can be associated with
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub id: u64,

    /// Unique location name, also its string form in user projections
    pub name: String,

    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Account role
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
    Admin,
}

/// A user row
///
/// Location links live in the `user_locations` table, not here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: u64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    /// Unique login name
    pub username: String,

    /// Stored as given; hashing is not performed
    pub password: String,

    #[serde(default)]
    pub role: Role,

    pub age: i16,
}

/// A category row
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub id: u64,

    /// Unique category name
    pub name: String,
}

/// An ad row
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdRecord {
    pub id: u64,
    pub name: String,

    /// Id of the owning user
    pub author_id: u64,

    pub price: u32,
    pub description: String,
    pub is_published: bool,

    /// Path of the stored image relative to the media root, e.g. `images/car.jpg`
    pub image: Option<String>,

    /// Id of the category
    pub category_id: u64,
}

/// Request payload for creating an ad
///
/// # Example
/// ```json
/// {
///   "name": "Bicycle",
///   "author": "alice",
///   "category": "Sport",
///   "price": 1200,
///   "description": "Barely used",
///   "is_published": true
/// }
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct CreateAdRequest {
    pub name: String,

    /// Username of the author
    pub author: String,

    /// Name of the category
    pub category: String,

    pub price: u32,
    pub description: String,
    pub is_published: bool,
}

/// Request payload for a partial ad update
///
/// Absent fields keep their stored value.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateAdRequest {
    pub name: Option<String>,
    pub price: Option<u32>,
    pub description: Option<String>,
    pub is_published: Option<bool>,
}

/// Request payload for creating a user
#[derive(Deserialize, Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password: String,
    pub age: i16,

    /// Location names, created on first use
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Request payload for a partial user update
///
/// `locations` are added to the user's existing set. The names are nullable
/// columns: an explicit `null` clears them, an absent key leaves them alone.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
    pub age: Option<i16>,
    pub role: Option<Role>,

    #[serde(default)]
    pub locations: Vec<String>,
}

/// Marks a key as present, so `null` becomes `Some(None)` rather than `None`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Request payload for creating a category
#[derive(Deserialize, Debug, Clone)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// An ad joined with the names of its author and category
#[derive(Debug, Clone)]
pub struct AdRow {
    pub ad: AdRecord,
    pub author: String,
    pub category: String,
}

/// A user joined with its location names and published ad count
#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: UserRecord,
    pub locations: Vec<String>,
    pub total_ads: u64,
}

/// JSON shape of an ad
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdView {
    pub id: u64,
    pub name: String,
    pub author: String,
    pub price: u32,
    pub description: String,
    pub is_published: bool,
    pub category: String,

    /// Public URL of the image, null when none is attached
    pub image: Option<String>,
}

impl AdView {
    pub fn new(row: AdRow, media_url: &str) -> Self {
        let AdRow { ad, author, category } = row;
        Self {
            id: ad.id,
            name: ad.name,
            author,
            price: ad.price,
            description: ad.description,
            is_published: ad.is_published,
            category,
            image: ad.image.map(|path| format!("{media_url}{path}")),
        }
    }
}

/// JSON shape of a user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserView {
    pub id: u64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub age: i16,
    pub locations: Vec<String>,

    /// Number of the user's published ads
    pub total_ads: u64,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        let UserRow { user, locations, total_ads } = row;
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            age: user.age,
            locations,
            total_ads,
        }
    }
}

/// One page of a list endpoint
///
/// `per_page` carries the number of pages, matching the wire format the
/// frontend already consumes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    #[serde(rename = "per_page")]
    pub num_pages: usize,
}

impl<T> PageResponse<T> {
    /// Converts every item, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            num_pages: self.num_pages,
        }
    }
}

/// Query parameters of the list endpoints
///
/// `page` is kept raw so that non-numeric values fall back to page 1
/// instead of rejecting the request.
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    pub page: Option<String>,
}
