use crate::url::domain::host_allowed;
use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical form for the crawled host
///
/// # Normalization Steps
///
/// 1. Resolve `raw` against `base` when given, otherwise parse it as absolute
/// 2. Accept only HTTP and HTTPS schemes
/// 3. Reject hosts that are not equal to or ending with `allowed_host`
/// 4. Remove fragment (everything after #)
/// 5. Remove the query string entirely
/// 6. Drop default ports (80 for http, 443 for https)
/// 7. Remove trailing slashes from the path (except for root /)
///
/// The url parser already lowercases the host, resolves dot segments and turns an
/// empty path into `/`.
///
/// # Examples
///
/// ```
/// use ui_harvest::url::normalize_url;
///
/// let url = normalize_url("https://POAP.xyz:443/events/?page=2#top", None, "poap.xyz").unwrap();
/// assert_eq!(url.as_str(), "https://poap.xyz/events");
///
/// assert!(normalize_url("https://other.org/", None, "poap.xyz").is_err());
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>, allowed_host: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();

    // Step 1: Parse or resolve
    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(e.to_string()))?;

    // Step 2: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 3: Host filter
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    if !host_allowed(host, allowed_host) {
        return Err(UrlError::OffHost {
            host: host.to_string(),
            allowed: allowed_host.to_string(),
        });
    }

    // Step 4 & 5: Fragment and query
    url.set_fragment(None);
    url.set_query(None);

    // Step 6 needs no work: `Url` never stores a port equal to the scheme default.

    // Step 7: Trailing slashes
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}
