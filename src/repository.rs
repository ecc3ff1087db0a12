//! Post repository: manifest loading and read-through post resolution.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::cache::{CacheEntry, CacheError, CacheStore, ContentCache, DEFAULT_TTL, SweepReport};
use crate::post::{Post, PostParseError, parse_manifest};
use crate::source::{FetchError, Fetcher};

/// Manifest location used by the published blog layout.
pub const DEFAULT_MANIFEST: &str = "posts/list.txt";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to load manifest {path}: {source}")]
    Manifest { path: String, source: FetchError },
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Why a single post could not be loaded. Never fatal to a resolution pass.
#[derive(Debug, Error)]
pub enum PostLoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] PostParseError),
}

/// Owns the resolved post collection and the cache it reads through.
#[derive(Debug)]
pub struct Repository<F, S> {
    fetcher: F,
    cache: ContentCache<S>,
    ttl: Duration,
    posts: Vec<Post>,
}

impl<F: Fetcher, S: CacheStore> Repository<F, S> {
    pub fn new(fetcher: F, cache: ContentCache<S>) -> Self {
        Self {
            fetcher,
            cache,
            ttl: DEFAULT_TTL,
            posts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub const fn cache(&self) -> &ContentCache<S> {
        &self.cache
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, index: usize) -> Option<&Post> {
        self.posts.get(index)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Fetch and parse the manifest. Manifests are never cached.
    ///
    /// # Errors
    /// Returns [`RepositoryError::Manifest`] if the manifest cannot be fetched.
    pub fn load_manifest(&self, path: &str) -> Result<Vec<String>, RepositoryError> {
        let text = self
            .fetcher
            .fetch(path)
            .map_err(|source| RepositoryError::Manifest {
                path: path.to_string(),
                source,
            })?;
        Ok(parse_manifest(&text))
    }

    /// Load the manifest at `manifest_path` and resolve every post in it,
    /// replacing the current collection.
    ///
    /// # Errors
    /// Returns an error only if the manifest itself cannot be loaded; posts
    /// that fail individually are skipped.
    pub fn load(&mut self, manifest_path: &str) -> Result<&[Post], RepositoryError> {
        let identifiers = self.load_manifest(manifest_path)?;
        self.posts = self.resolve_all(&identifiers);
        Ok(&self.posts)
    }

    /// Resolve `identifiers` in order, one at a time.
    ///
    /// Live cache entries are used as-is. Anything else is fetched, parsed
    /// and written back to the cache. Identifiers that cannot be loaded are
    /// logged and left out of the result.
    pub fn resolve_all<I: AsRef<str>>(&mut self, identifiers: &[I]) -> Vec<Post> {
        let started = Instant::now();
        let mut posts = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            match self.resolve(identifier) {
                Ok(post) => posts.push(post),
                Err(err) => {
                    tracing::warn!(identifier, error = %err, "skipping post");
                }
            }
        }
        tracing::debug!(
            requested = identifiers.len(),
            resolved = posts.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "resolved posts"
        );
        posts
    }

    /// Resolve one identifier through the cache.
    ///
    /// # Errors
    /// Returns an error if the post has to be fetched and the fetch or parse
    /// fails.
    pub fn resolve(&mut self, identifier: &str) -> Result<Post, PostLoadError> {
        if let Some(entry) = self.cache.read(identifier) {
            if !self.cache.is_expired(&entry, self.ttl) {
                tracing::debug!(identifier, "cache hit");
                return Ok(entry.post);
            }
            tracing::debug!(identifier, cached_at = entry.cached_at, "cache entry expired");
            if let Err(err) = self.cache.delete(identifier) {
                tracing::warn!(identifier, error = %err, "failed to evict expired entry");
            }
        }

        let raw = self.fetcher.fetch(identifier)?;
        let post = Post::parse(identifier, &raw)?;
        let entry = CacheEntry {
            post,
            cached_at: self.cache.now(),
        };
        if let Err(err) = self.cache.write(identifier, &entry) {
            tracing::warn!(identifier, error = %err, "failed to cache post");
        }
        Ok(entry.post)
    }

    /// Evict cache entries older than the repository's TTL.
    ///
    /// # Errors
    /// Returns an error if an eviction cannot be persisted.
    pub fn sweep_expired(&mut self) -> Result<SweepReport, RepositoryError> {
        Ok(self.cache.sweep_expired(self.ttl)?)
    }

    /// Drop every cached entry. Already resolved posts stay in memory.
    ///
    /// # Errors
    /// Returns an error if the cache namespace cannot be persisted.
    pub fn clear_cache(&mut self) -> Result<(), RepositoryError> {
        self.cache.clear_all()?;
        tracing::info!("post cache cleared");
        Ok(())
    }
}
