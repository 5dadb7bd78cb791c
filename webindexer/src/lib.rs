//! Directory browser library: settings resolution, access filtering, ordered
//! listings, thumbnails and the HTTP front end that serves them.

pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod lister;
pub mod server;
pub mod sorter;
pub mod utils;

pub use config::{resolve_settings, Config, Credentials, Settings, SortDir, SortStyle};
pub use error::{IndexerError, Result};
pub use lister::{list_entries, Entry, ListingContext};
