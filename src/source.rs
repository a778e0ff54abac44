//! Defines the [`Source`] trait through which every data document (the posts
//! collection and the stats widgets) is fetched, plus the [`FileSource`]
//! implementation which serves `file://` URLs from disk.

use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;
use url::Url;

/// The query parameter appended to every request so that intermediate caches
/// never serve a stale document.
pub const CACHE_BUST_PARAM: &str = "ts";

/// Anything that can resolve a URL to the text of a document. Implementations
/// must be shareable across the loader threads.
pub trait Source: Send + Sync {
    /// Fetches the document at `url`. The query string is part of the request
    /// but implementations are free to ignore it.
    fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Serves `file://` URLs by reading the file they point at. The query string
/// (including the cache-busting parameter) is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSource;

impl Source for FileSource {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        if url.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_owned()));
        }
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::InvalidPath(url.to_string()))?;
        std::fs::read_to_string(&path).map_err(|err| FetchError::Io { path, err })
    }
}

/// Returns a copy of `url` with a `ts=<unix millis>` query parameter.
pub fn cache_busted(url: &Url) -> Url {
    let mut busted = url.clone();
    busted
        .query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &Utc::now().timestamp_millis().to_string());
    busted
}

/// Represents a failure to fetch a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Returned when the URL's scheme can't be served by the source.
    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),

    /// Returned when a `file://` URL doesn't map onto a local path.
    #[error("URL `{0}` does not name a local file")]
    InvalidPath(String),

    /// Returned when the underlying file can't be read.
    #[error("reading `{}`: {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cache_busted_appends_timestamp() -> Result<(), url::ParseError> {
        let url = Url::parse("file:///site/data/posts.json")?;
        let busted = cache_busted(&url);
        assert_eq!(url.path(), busted.path());
        let pairs: Vec<_> = busted.query_pairs().collect();
        assert_eq!(1, pairs.len());
        assert_eq!(CACHE_BUST_PARAM, pairs[0].0);
        assert!(pairs[0].1.parse::<i64>().is_ok());
        Ok(())
    }

    #[test]
    fn test_file_source_ignores_query() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "[]")?;
        let url = Url::from_file_path(&path).map_err(|()| "bad path")?;
        assert_eq!("[]", FileSource.fetch(&cache_busted(&url))?);
        Ok(())
    }

    #[test]
    fn test_file_source_missing_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let url = Url::from_file_path(dir.path().join("nope.json"))
            .map_err(|()| "bad path")?;
        assert!(matches!(FileSource.fetch(&url), Err(FetchError::Io { .. })));
        Ok(())
    }

    #[test]
    fn test_file_source_rejects_http() -> Result<(), url::ParseError> {
        let url = Url::parse("https://example.org/data/posts.json")?;
        assert!(matches!(
            FileSource.fetch(&url),
            Err(FetchError::UnsupportedScheme(scheme)) if scheme == "https"
        ));
        Ok(())
    }
}
