//! Reads and writes against the database
//!
//! Each public function runs in a single transaction. Write paths keep the
//! index tables from `database` in step with the rows they point at.

use redb::{
    Database, ReadableDatabase, ReadableMultimapTable, ReadableTable, ReadableTableMetadata,
    WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::database::{
    LinkTable, NameIndex, RowTable, TABLE_ADS, TABLE_ADS_BY_AUTHOR, TABLE_ADS_BY_CATEGORY,
    TABLE_ADS_BY_PRICE, TABLE_CATEGORIES, TABLE_CATEGORY_NAMES, TABLE_LOCATIONS,
    TABLE_LOCATION_NAMES, TABLE_SEQUENCES, TABLE_USERNAMES, TABLE_USERS, TABLE_USER_LOCATIONS,
};
use crate::error::{Error, Result};
use crate::model::{
    AdRecord, AdRow, CategoryRecord, CreateAdRequest, CreateUserRequest, LocationRecord,
    PageResponse, UpdateAdRequest, UpdateUserRequest, UserRecord, UserRow,
};
use crate::pagination::Paginator;

// ── Row helpers ─────────────────────────────────────────────────────────────

fn load<T, R>(table: &T, id: u64) -> Result<Option<R>>
where
    T: ReadableTable<u64, &'static str>,
    R: DeserializeOwned,
{
    match table.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

fn lookup<T>(index: &T, name: &str) -> Result<Option<u64>>
where
    T: ReadableTable<&'static str, u64>,
{
    Ok(index.get(name)?.map(|guard| guard.value()))
}

fn linked<T>(links: &T, id: u64) -> Result<Vec<u64>>
where
    T: ReadableMultimapTable<u64, u64>,
{
    let ids = links
        .get(id)?
        .map(|entry| entry.map(|guard| guard.value()))
        .collect::<Result<Vec<u64>, _>>()?;
    Ok(ids)
}

fn put<R: Serialize>(txn: &WriteTransaction, def: RowTable, id: u64, row: &R) -> Result<()> {
    let json = serde_json::to_string(row)?;
    let mut table = txn.open_table(def)?;
    table.insert(id, json.as_str())?;
    Ok(())
}

fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut table = txn.open_table(TABLE_SEQUENCES)?;
    let next = table.get(sequence)?.map(|guard| guard.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

/// Claims `name` in a unique index, failing if another row holds it
fn claim_name(txn: &WriteTransaction, index: NameIndex, name: &str, id: u64) -> Result<()> {
    let mut table = txn.open_table(index)?;
    if table.get(name)?.is_some() {
        return Err(Error::Conflict(format!("'{name}' already exists")));
    }
    table.insert(name, id)?;
    Ok(())
}

/// Loads the rows with the given ids, in order, skipping ids with no row
fn load_all<T, R>(table: &T, ids: &[u64]) -> Result<Vec<R>>
where
    T: ReadableTable<u64, &'static str>,
    R: DeserializeOwned,
{
    ids.iter()
        .filter_map(|&id| load(table, id).transpose())
        .collect()
}

// ── Joins ───────────────────────────────────────────────────────────────────

fn join_ad<U, C>(ad: AdRecord, users: &U, categories: &C) -> Result<AdRow>
where
    U: ReadableTable<u64, &'static str>,
    C: ReadableTable<u64, &'static str>,
{
    let author: UserRecord = load(users, ad.author_id)?
        .ok_or_else(|| Error::not_found(format_args!("user {}", ad.author_id)))?;
    let category: CategoryRecord = load(categories, ad.category_id)?
        .ok_or_else(|| Error::not_found(format_args!("category {}", ad.category_id)))?;

    Ok(AdRow {
        ad,
        author: author.username,
        category: category.name,
    })
}

fn join_user<L, UL, A, AA>(
    user: UserRecord,
    locations: &L,
    user_locations: &UL,
    ads: &A,
    ads_by_author: &AA,
) -> Result<UserRow>
where
    L: ReadableTable<u64, &'static str>,
    UL: ReadableMultimapTable<u64, u64>,
    A: ReadableTable<u64, &'static str>,
    AA: ReadableMultimapTable<u64, u64>,
{
    let location_ids = linked(user_locations, user.id)?;
    let locations = load_all::<_, LocationRecord>(locations, &location_ids)?
        .into_iter()
        .map(|location| location.name)
        .collect();

    let ad_ids = linked(ads_by_author, user.id)?;
    let total_ads = load_all::<_, AdRecord>(ads, &ad_ids)?
        .iter()
        .filter(|ad| ad.is_published)
        .count() as u64;

    Ok(UserRow {
        user,
        locations,
        total_ads,
    })
}

fn ad_row_in(txn: &WriteTransaction, ad: AdRecord) -> Result<AdRow> {
    let users = txn.open_table(TABLE_USERS)?;
    let categories = txn.open_table(TABLE_CATEGORIES)?;
    join_ad(ad, &users, &categories)
}

fn user_row_in(txn: &WriteTransaction, user: UserRecord) -> Result<UserRow> {
    let locations = txn.open_table(TABLE_LOCATIONS)?;
    let user_locations = txn.open_multimap_table(TABLE_USER_LOCATIONS)?;
    let ads = txn.open_table(TABLE_ADS)?;
    let ads_by_author = txn.open_multimap_table(TABLE_ADS_BY_AUTHOR)?;
    join_user(user, &locations, &user_locations, &ads, &ads_by_author)
}

// ── Ads ─────────────────────────────────────────────────────────────────────

fn index_ad(txn: &WriteTransaction, ad: &AdRecord) -> Result<()> {
    let mut by_price = txn.open_table(TABLE_ADS_BY_PRICE)?;
    by_price.insert((ad.price, ad.id), ())?;

    let mut by_author = txn.open_multimap_table(TABLE_ADS_BY_AUTHOR)?;
    by_author.insert(ad.author_id, ad.id)?;

    let mut by_category = txn.open_multimap_table(TABLE_ADS_BY_CATEGORY)?;
    by_category.insert(ad.category_id, ad.id)?;
    Ok(())
}

fn remove_ad(txn: &WriteTransaction, ad: &AdRecord) -> Result<()> {
    let mut ads = txn.open_table(TABLE_ADS)?;
    ads.remove(ad.id)?;

    let mut by_price = txn.open_table(TABLE_ADS_BY_PRICE)?;
    by_price.remove((ad.price, ad.id))?;

    let mut by_author = txn.open_multimap_table(TABLE_ADS_BY_AUTHOR)?;
    by_author.remove(ad.author_id, ad.id)?;

    let mut by_category = txn.open_multimap_table(TABLE_ADS_BY_CATEGORY)?;
    by_category.remove(ad.category_id, ad.id)?;
    Ok(())
}

fn load_ad(txn: &WriteTransaction, id: u64) -> Result<AdRecord> {
    let ads = txn.open_table(TABLE_ADS)?;
    load(&ads, id)?.ok_or_else(|| Error::not_found(format_args!("ad {id}")))
}

/// One page of ads, most expensive first
pub fn list_ads(db: &Database, per_page: usize, page: Option<&str>) -> Result<PageResponse<AdRow>> {
    let read_txn = db.begin_read()?;
    let by_price = read_txn.open_table(TABLE_ADS_BY_PRICE)?;

    let paginator = Paginator::new(by_price.len()? as usize, per_page);
    let bounds = paginator.bounds(paginator.resolve_page(page));

    let ids = by_price
        .iter()?
        .rev()
        .skip(bounds.start)
        .take(bounds.len())
        .map(|entry| entry.map(|(key, _)| key.value().1))
        .collect::<Result<Vec<u64>, _>>()?;

    let ads = read_txn.open_table(TABLE_ADS)?;
    let users = read_txn.open_table(TABLE_USERS)?;
    let categories = read_txn.open_table(TABLE_CATEGORIES)?;

    let items = load_all::<_, AdRecord>(&ads, &ids)?
        .into_iter()
        .map(|ad| join_ad(ad, &users, &categories))
        .collect::<Result<Vec<_>>>()?;

    Ok(PageResponse {
        items,
        total: paginator.count(),
        num_pages: paginator.num_pages(),
    })
}

/// Loads one ad with its author and category names
///
/// Fails with `Error::NotFound` if no ad has `id`.
pub fn get_ad(db: &Database, id: u64) -> Result<AdRow> {
    let read_txn = db.begin_read()?;
    let ads = read_txn.open_table(TABLE_ADS)?;
    let ad: AdRecord = load(&ads, id)?.ok_or_else(|| Error::not_found(format_args!("ad {id}")))?;

    let users = read_txn.open_table(TABLE_USERS)?;
    let categories = read_txn.open_table(TABLE_CATEGORIES)?;
    join_ad(ad, &users, &categories)
}

/// Inserts an ad after resolving its author and category by name
pub fn create_ad(db: &Database, request: CreateAdRequest) -> Result<AdRow> {
    let write_txn = db.begin_write()?;

    let author_id = lookup(&write_txn.open_table(TABLE_USERNAMES)?, &request.author)?
        .ok_or_else(|| Error::not_found(format_args!("user '{}'", request.author)))?;
    let category_id = lookup(&write_txn.open_table(TABLE_CATEGORY_NAMES)?, &request.category)?
        .ok_or_else(|| Error::not_found(format_args!("category '{}'", request.category)))?;

    let ad = AdRecord {
        id: next_id(&write_txn, "ads")?,
        name: request.name,
        author_id,
        price: request.price,
        description: request.description,
        is_published: request.is_published,
        image: None,
        category_id,
    };

    put(&write_txn, TABLE_ADS, ad.id, &ad)?;
    index_ad(&write_txn, &ad)?;
    let row = ad_row_in(&write_txn, ad)?;

    write_txn.commit()?;
    Ok(row)
}

/// Applies the fields present in `request`; author and category stay as they are
pub fn update_ad(db: &Database, id: u64, request: UpdateAdRequest) -> Result<AdRow> {
    let write_txn = db.begin_write()?;
    let mut ad = load_ad(&write_txn, id)?;

    if let Some(name) = request.name {
        ad.name = name;
    }
    if let Some(price) = request.price {
        if price != ad.price {
            let mut by_price = write_txn.open_table(TABLE_ADS_BY_PRICE)?;
            by_price.remove((ad.price, ad.id))?;
            by_price.insert((price, ad.id), ())?;
        }
        ad.price = price;
    }
    if let Some(description) = request.description {
        ad.description = description;
    }
    if let Some(is_published) = request.is_published {
        ad.is_published = is_published;
    }

    put(&write_txn, TABLE_ADS, ad.id, &ad)?;
    let row = ad_row_in(&write_txn, ad)?;

    write_txn.commit()?;
    Ok(row)
}

/// Points the ad's image at `path`, relative to the media root
pub fn set_ad_image(db: &Database, id: u64, path: String) -> Result<AdRow> {
    let write_txn = db.begin_write()?;
    let mut ad = load_ad(&write_txn, id)?;

    ad.image = Some(path);
    put(&write_txn, TABLE_ADS, ad.id, &ad)?;
    let row = ad_row_in(&write_txn, ad)?;

    write_txn.commit()?;
    Ok(row)
}

/// Removes the ad row and its price, author and category index entries
pub fn delete_ad(db: &Database, id: u64) -> Result<()> {
    let write_txn = db.begin_write()?;
    let ad = load_ad(&write_txn, id)?;
    remove_ad(&write_txn, &ad)?;
    write_txn.commit()?;
    Ok(())
}

/// Deletes every ad linked to `parent` in `links`
fn cascade_ads(
    txn: &WriteTransaction,
    links: LinkTable,
    parent: u64,
) -> Result<usize> {
    let ids = linked(&txn.open_multimap_table(links)?, parent)?;
    let ads: Vec<AdRecord> = load_all(&txn.open_table(TABLE_ADS)?, &ids)?;
    for ad in &ads {
        remove_ad(txn, ad)?;
    }
    Ok(ads.len())
}

// ── Locations ───────────────────────────────────────────────────────────────

/// Get-or-create a location by name, returning its id
fn upsert_location(txn: &WriteTransaction, name: &str) -> Result<u64> {
    let existing = lookup(&txn.open_table(TABLE_LOCATION_NAMES)?, name)?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let location = LocationRecord {
        id: next_id(txn, "locations")?,
        name: name.to_string(),
        lat: None,
        lng: None,
    };
    put(txn, TABLE_LOCATIONS, location.id, &location)?;
    claim_name(txn, TABLE_LOCATION_NAMES, name, location.id)?;

    tracing::debug!(id = location.id, name, "location created");
    Ok(location.id)
}

fn attach_locations(txn: &WriteTransaction, user_id: u64, names: &[String]) -> Result<()> {
    for name in names {
        let location_id = upsert_location(txn, name)?;
        let mut user_locations = txn.open_multimap_table(TABLE_USER_LOCATIONS)?;
        user_locations.insert(user_id, location_id)?;
    }
    Ok(())
}

/// All locations, ordered by name
pub fn list_locations(db: &Database) -> Result<Vec<LocationRecord>> {
    let read_txn = db.begin_read()?;
    let names = read_txn.open_table(TABLE_LOCATION_NAMES)?;
    let ids = names
        .iter()?
        .map(|entry| entry.map(|(_, id)| id.value()))
        .collect::<Result<Vec<u64>, _>>()?;

    load_all(&read_txn.open_table(TABLE_LOCATIONS)?, &ids)
}

// ── Users ───────────────────────────────────────────────────────────────────

fn load_user(txn: &WriteTransaction, id: u64) -> Result<UserRecord> {
    let users = txn.open_table(TABLE_USERS)?;
    load(&users, id)?.ok_or_else(|| Error::not_found(format_args!("user {id}")))
}

/// One page of users, ordered by username
pub fn list_users(
    db: &Database,
    per_page: usize,
    page: Option<&str>,
) -> Result<PageResponse<UserRow>> {
    let read_txn = db.begin_read()?;
    let usernames = read_txn.open_table(TABLE_USERNAMES)?;

    let paginator = Paginator::new(usernames.len()? as usize, per_page);
    let bounds = paginator.bounds(paginator.resolve_page(page));

    let ids = usernames
        .iter()?
        .skip(bounds.start)
        .take(bounds.len())
        .map(|entry| entry.map(|(_, id)| id.value()))
        .collect::<Result<Vec<u64>, _>>()?;

    let users = read_txn.open_table(TABLE_USERS)?;
    let locations = read_txn.open_table(TABLE_LOCATIONS)?;
    let user_locations = read_txn.open_multimap_table(TABLE_USER_LOCATIONS)?;
    let ads = read_txn.open_table(TABLE_ADS)?;
    let ads_by_author = read_txn.open_multimap_table(TABLE_ADS_BY_AUTHOR)?;

    let items = load_all::<_, UserRecord>(&users, &ids)?
        .into_iter()
        .map(|user| join_user(user, &locations, &user_locations, &ads, &ads_by_author))
        .collect::<Result<Vec<_>>>()?;

    Ok(PageResponse {
        items,
        total: paginator.count(),
        num_pages: paginator.num_pages(),
    })
}

/// Loads one user with location names and the published ad count
pub fn get_user(db: &Database, id: u64) -> Result<UserRow> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(TABLE_USERS)?;
    let user: UserRecord =
        load(&users, id)?.ok_or_else(|| Error::not_found(format_args!("user {id}")))?;

    join_user(
        user,
        &read_txn.open_table(TABLE_LOCATIONS)?,
        &read_txn.open_multimap_table(TABLE_USER_LOCATIONS)?,
        &read_txn.open_table(TABLE_ADS)?,
        &read_txn.open_multimap_table(TABLE_ADS_BY_AUTHOR)?,
    )
}

/// Inserts a user and links the named locations, creating missing ones
pub fn create_user(db: &Database, request: CreateUserRequest) -> Result<UserRow> {
    let write_txn = db.begin_write()?;

    let user = UserRecord {
        id: next_id(&write_txn, "users")?,
        first_name: Some(request.first_name),
        last_name: Some(request.last_name),
        username: request.username,
        password: request.password,
        role: request.role,
        age: request.age,
    };

    claim_name(&write_txn, TABLE_USERNAMES, &user.username, user.id)?;
    put(&write_txn, TABLE_USERS, user.id, &user)?;
    attach_locations(&write_txn, user.id, &request.locations)?;
    let row = user_row_in(&write_txn, user)?;

    write_txn.commit()?;
    Ok(row)
}

/// Applies the fields present in `request` and adds any new locations
pub fn update_user(db: &Database, id: u64, request: UpdateUserRequest) -> Result<UserRow> {
    let write_txn = db.begin_write()?;
    let mut user = load_user(&write_txn, id)?;

    if let Some(first_name) = request.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = request.last_name {
        user.last_name = last_name;
    }
    if let Some(age) = request.age {
        user.age = age;
    }
    if let Some(role) = request.role {
        user.role = role;
    }

    put(&write_txn, TABLE_USERS, user.id, &user)?;
    attach_locations(&write_txn, user.id, &request.locations)?;
    let row = user_row_in(&write_txn, user)?;

    write_txn.commit()?;
    Ok(row)
}

/// Deletes a user together with their ads and location links
pub fn delete_user(db: &Database, id: u64) -> Result<()> {
    let write_txn = db.begin_write()?;
    let user = load_user(&write_txn, id)?;

    let removed = cascade_ads(&write_txn, TABLE_ADS_BY_AUTHOR, user.id)?;
    {
        let mut user_locations = write_txn.open_multimap_table(TABLE_USER_LOCATIONS)?;
        user_locations.remove_all(user.id)?;

        let mut usernames = write_txn.open_table(TABLE_USERNAMES)?;
        usernames.remove(user.username.as_str())?;

        let mut users = write_txn.open_table(TABLE_USERS)?;
        users.remove(user.id)?;
    }

    write_txn.commit()?;
    tracing::debug!(id, ads = removed, "user deleted");
    Ok(())
}

// ── Categories ──────────────────────────────────────────────────────────────

/// All categories, ordered by name
pub fn list_categories(db: &Database) -> Result<Vec<CategoryRecord>> {
    let read_txn = db.begin_read()?;
    let names = read_txn.open_table(TABLE_CATEGORY_NAMES)?;
    let ids = names
        .iter()?
        .map(|entry| entry.map(|(_, id)| id.value()))
        .collect::<Result<Vec<u64>, _>>()?;

    load_all(&read_txn.open_table(TABLE_CATEGORIES)?, &ids)
}

/// Loads one category, `Error::NotFound` if absent
pub fn get_category(db: &Database, id: u64) -> Result<CategoryRecord> {
    let read_txn = db.begin_read()?;
    let categories = read_txn.open_table(TABLE_CATEGORIES)?;
    load(&categories, id)?.ok_or_else(|| Error::not_found(format_args!("category {id}")))
}

/// Inserts a category, `Error::Conflict` if the name is taken
pub fn create_category(db: &Database, name: String) -> Result<CategoryRecord> {
    let write_txn = db.begin_write()?;

    let category = CategoryRecord {
        id: next_id(&write_txn, "categories")?,
        name,
    };
    claim_name(&write_txn, TABLE_CATEGORY_NAMES, &category.name, category.id)?;
    put(&write_txn, TABLE_CATEGORIES, category.id, &category)?;

    write_txn.commit()?;
    Ok(category)
}

/// Deletes a category together with its ads
pub fn delete_category(db: &Database, id: u64) -> Result<()> {
    let write_txn = db.begin_write()?;
    let category: CategoryRecord = load(&write_txn.open_table(TABLE_CATEGORIES)?, id)?
        .ok_or_else(|| Error::not_found(format_args!("category {id}")))?;

    let removed = cascade_ads(&write_txn, TABLE_ADS_BY_CATEGORY, category.id)?;
    {
        let mut names = write_txn.open_table(TABLE_CATEGORY_NAMES)?;
        names.remove(category.name.as_str())?;

        let mut categories = write_txn.open_table(TABLE_CATEGORIES)?;
        categories.remove(category.id)?;
    }

    write_txn.commit()?;
    tracing::debug!(id, ads = removed, "category deleted");
    Ok(())
}
