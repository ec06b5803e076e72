//! URL resolution against the application origin.

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

/// Resolve a request URL the way the host resolves `fetch` arguments.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Root-relative and relative inputs are joined onto `origin`
/// 3. Absolute inputs must use http or https
/// 4. Remove fragment (#...); the query string is kept as-is
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Parse an application origin, rejecting anything that is not an absolute
/// http(s) URL.
pub fn parse_origin(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
    if parsed.host_str().is_none() {
        return Err(UrlError::InvalidUrl(format!("origin has no host: {trimmed}")));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://moodify.example").unwrap()
    }

    #[test]
    fn test_resolve_root_relative() {
        let url = resolve(&origin(), "/css/styles.css").unwrap();
        assert_eq!(url.as_str(), "https://moodify.example/css/styles.css");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&origin(), "/").unwrap();
        assert_eq!(url.as_str(), "https://moodify.example/");
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn test_resolve_absolute_keeps_foreign_host() {
        let url = resolve(&origin(), "https://cdnjs.cloudflare.com/ajax/libs/Chart.js/3.9.1/chart.min.js").unwrap();
        assert_eq!(url.host_str(), Some("cdnjs.cloudflare.com"));
    }

    #[test]
    fn test_resolve_lowercases_host() {
        let url = resolve(&origin(), "https://CDN.EXAMPLE/lib.js").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example"));
    }

    #[test]
    fn test_resolve_removes_fragment_keeps_query() {
        let url = resolve(&origin(), "/index.html?mood=calm#top").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("mood=calm"));
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_parse_origin_requires_scheme() {
        assert!(parse_origin("moodify.example").is_err());
        assert!(parse_origin("http://localhost:8080").is_ok());
    }
}
