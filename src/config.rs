//! Runtime configuration read from the environment
//!
//! Every setting has a default so the service starts with no `.env` file at all.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Service settings shared by all handlers
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (`PORT`)
    pub port: u16,

    /// Path of the redb file (`DATABASE_URL`)
    pub database_url: String,

    /// Page size of the ad and user lists (`TOTAL_ON_PAGE`)
    pub total_on_page: usize,

    /// Directory uploaded images are written under (`MEDIA_ROOT`)
    pub media_root: PathBuf,

    /// URL prefix stored files are addressed by (`MEDIA_URL`)
    pub media_url: String,

    /// Body limit of the image upload route (`MAX_UPLOAD_BYTES`)
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "data.db".to_string(),
            total_on_page: 10,
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Builds the configuration from environment variables
    ///
    /// Missing or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut media_url = env::var("MEDIA_URL").unwrap_or(defaults.media_url);
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        Self {
            port: parse_var("PORT", defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            total_on_page: parse_var("TOTAL_ON_PAGE", defaults.total_on_page).max(1),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            media_url,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
