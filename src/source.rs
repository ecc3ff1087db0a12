//! Where manifest and post resources come from.
//!
//! Identifiers in the manifest are relative paths such as `posts/intro.txt`.
//! A [`Fetcher`] resolves them against a content root, which is either a
//! local directory or a base URL.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default request timeout for remote content roots.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid resource url {resource}: {source}")]
    Url {
        resource: String,
        source: url::ParseError,
    },
    #[error("request for {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Loads the raw text of a resource.
pub trait Fetcher {
    /// Fetch `resource`, relative to the content root.
    ///
    /// # Errors
    /// Returns an error if the resource cannot be loaded.
    fn fetch(&self, resource: &str) -> Result<String, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, resource: &str) -> Result<String, FetchError> {
        (**self).fetch(resource)
    }
}

/// Reads resources from a directory.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, resource: &str) -> PathBuf {
        self.root.join(resource.trim_start_matches('/'))
    }
}

impl Fetcher for FsFetcher {
    fn fetch(&self, resource: &str) -> Result<String, FetchError> {
        let path = self.resolve(resource);
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

/// Fetches resources over HTTP relative to a base URL.
pub struct HttpFetcher {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher rooted at `base`.
    ///
    /// A trailing slash is added to `base` when missing so relative
    /// identifiers resolve beneath it rather than beside it.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(mut base: Url, timeout: Duration) -> Result<Self, FetchError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Http {
                url: base.to_string(),
                source,
            })?;
        Ok(Self { base, client })
    }

    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `resource`.
    ///
    /// # Errors
    /// Returns an error if `resource` cannot be joined onto the base.
    pub fn resolve(&self, resource: &str) -> Result<Url, FetchError> {
        self.base
            .join(resource.trim_start_matches('/'))
            .map_err(|source| FetchError::Url {
                resource: resource.to_string(),
                source,
            })
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, resource: &str) -> Result<String, FetchError> {
        let url = self.resolve(resource)?;
        tracing::debug!(url = %url, "fetching resource");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.text().map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}

/// A content root chosen at runtime.
#[derive(Debug)]
pub enum AnyFetcher {
    Fs(FsFetcher),
    Http(HttpFetcher),
}

impl AnyFetcher {
    /// Pick a fetcher for `source`: `http://` and `https://` roots are
    /// fetched remotely, anything else is a directory.
    ///
    /// # Errors
    /// Returns an error if `source` looks like a URL but does not parse, or
    /// the HTTP client cannot be built.
    pub fn from_source(source: &str, timeout: Duration) -> Result<Self, FetchError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let base = Url::parse(source).map_err(|err| FetchError::Url {
                resource: source.to_string(),
                source: err,
            })?;
            return Ok(Self::Http(HttpFetcher::new(base, timeout)?));
        }
        Ok(Self::Fs(FsFetcher::new(source)))
    }
}

impl Fetcher for AnyFetcher {
    fn fetch(&self, resource: &str) -> Result<String, FetchError> {
        match self {
            Self::Fs(fetcher) => fetcher.fetch(resource),
            Self::Http(fetcher) => fetcher.fetch(resource),
        }
    }
}
