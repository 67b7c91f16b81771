//! URL resolution against the application origin.
//!
//! Static assets and CLI inputs are written as paths (`/icon-192x192.png`);
//! requests carry absolute URLs. These helpers turn one into the other and
//! decide whether a URL belongs to the application.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve an absolute URL or an origin-relative path.
///
/// 1. Trim leading/trailing whitespace
/// 2. Inputs containing `://` are parsed as-is; anything else is joined onto `origin`
/// 3. Only http and https are accepted
/// 4. The query string is kept as written; the fragment is kept too, cache matching drops it
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = if trimmed.contains("://") {
        Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    } else {
        origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    };

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Whether `url` has the same scheme, host and port as `origin`.
pub fn is_same_origin(origin: &Url, url: &Url) -> bool {
    origin.origin() == url.origin()
}
