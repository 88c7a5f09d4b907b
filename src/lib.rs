//! Library exports for the classifieds service
//!
//! The binary only wires these together; tests drive them directly.

pub mod config;
pub mod database;
pub mod error;
pub mod handler;
pub mod media;
pub mod model;
pub mod pagination;
pub mod route;
pub mod store;
