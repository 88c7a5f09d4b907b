//! Database initialization and table definitions
//!
//! Every entity lives in its own table as JSON keyed by a numeric id.
//! Uniqueness, ordering, and relations are kept in index tables that are
//! written in the same transaction as the row they describe.

use redb::{Database, MultimapTableDefinition, TableDefinition};
use std::sync::Arc;

use crate::config::Config;

/// Shape of every row table: id -> JSON-serialized record
pub type RowTable = TableDefinition<'static, u64, &'static str>;

/// Shape of every unique-name index: name -> id
pub type NameIndex = TableDefinition<'static, &'static str, u64>;

/// Shape of every one-to-many link: parent id -> child ids
pub type LinkTable = MultimapTableDefinition<'static, u64, u64>;

/// Last id handed out per entity
///
/// Key: sequence name (`"ads"`, `"users"`, ...)
/// Value: last allocated id, ids start at 1
pub const TABLE_SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences_v1");

pub const TABLE_LOCATIONS: RowTable = TableDefinition::new("locations_v1");
pub const TABLE_LOCATION_NAMES: NameIndex = TableDefinition::new("location_names_v1");

pub const TABLE_USERS: RowTable = TableDefinition::new("users_v1");
pub const TABLE_USERNAMES: NameIndex = TableDefinition::new("usernames_v1");

/// Locations each user is associated with
pub const TABLE_USER_LOCATIONS: LinkTable = MultimapTableDefinition::new("user_locations_v1");

pub const TABLE_CATEGORIES: RowTable = TableDefinition::new("categories_v1");
pub const TABLE_CATEGORY_NAMES: NameIndex = TableDefinition::new("category_names_v1");

pub const TABLE_ADS: RowTable = TableDefinition::new("ads_v1");

/// Price ordering of ads
///
/// Key: `(price, ad_id)`; iterating in reverse gives the most expensive first
pub const TABLE_ADS_BY_PRICE: TableDefinition<(u32, u64), ()> =
    TableDefinition::new("ads_by_price_v1");

/// Ads owned by each user, used for published counts and cascade deletes
pub const TABLE_ADS_BY_AUTHOR: LinkTable = MultimapTableDefinition::new("ads_by_author_v1");

/// Ads filed under each category, used for cascade deletes
pub const TABLE_ADS_BY_CATEGORY: LinkTable = MultimapTableDefinition::new("ads_by_category_v1");

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database
    pub db: Arc<Database>,

    /// Settings read at startup
    pub config: Arc<Config>,
}

/// Creates or opens the database file and makes sure every table exists
///
/// # Example
///
/// ```no_run
/// # use classifieds::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_SEQUENCES)?;

        for table in [TABLE_LOCATIONS, TABLE_USERS, TABLE_CATEGORIES, TABLE_ADS] {
            write_txn.open_table(table)?;
        }
        for index in [TABLE_LOCATION_NAMES, TABLE_USERNAMES, TABLE_CATEGORY_NAMES] {
            write_txn.open_table(index)?;
        }
        for links in [TABLE_USER_LOCATIONS, TABLE_ADS_BY_AUTHOR, TABLE_ADS_BY_CATEGORY] {
            write_txn.open_multimap_table(links)?;
        }

        write_txn.open_table(TABLE_ADS_BY_PRICE)?;
    }
    write_txn.commit()?;

    Ok(db)
}
