// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. cache::CacheEntry)
    clippy::module_name_repetitions
)]

//! # Coreblog
//!
//! A plain-text blog engine with media embedding and a post cache.
//!
//! Coreblog turns a directory (or web root) of plain-text posts into HTML:
//! - Lightweight markup with automatic media embeds for bare links
//! - Read-through post cache with time-to-live expiry
//! - Transliterated slugs for shareable article links
//! - File watching for rebuild-on-save
//!
//! ## Architecture
//!
//! Posts flow through a short pipeline:
//! - **Manifest**: ordered post identifiers, always fetched fresh
//! - **Repository**: resolves each identifier through the cache
//! - **Markup**: converts a post body into an HTML fragment
//! - **Page**: assembles the table of contents and article view
//!
//! ## Modules
//!
//! - [`cache`]: Versioned post envelopes and TTL sweeps
//! - [`config`]: Saved command-line defaults
//! - [`markup`]: Markup and media embedding
//! - [`page`]: HTML page assembly and deep links
//! - [`post`]: Post and manifest parsing
//! - [`repository`]: Manifest loading and post resolution
//! - [`search`]: Title search
//! - [`slug`]: Cyrillic transliteration
//! - [`source`]: Filesystem and HTTP fetching
//! - [`watcher`]: Content root watching

pub mod cache;
pub mod config;
pub mod markup;
pub mod page;
pub mod post;
pub mod repository;
pub mod search;
pub mod slug;
pub mod source;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{ContentCache, FileStore, MemoryStore};
    pub use crate::markup::Renderer;
    pub use crate::post::Post;
    pub use crate::repository::Repository;
    pub use crate::source::{AnyFetcher, Fetcher};
}
