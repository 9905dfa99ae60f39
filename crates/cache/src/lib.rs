//! SQLite persistence for the music library.
//!
//! Holds the track graph (artists, albums, mediums, tracks, media files), the
//! storage roots and the naming patterns. Entities are returned as
//! `renamarr-naming` models so they can be rendered directly.
//!
//! The schema and a default naming pattern are created by embedded
//! migrations when connecting.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
