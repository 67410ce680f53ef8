//! Photo URL normalization.
//!
//! The store returns photo locations in three shapes: absolute URLs minted
//! against a development loopback host, absolute URLs elsewhere, and paths
//! relative to the API root. Display layers need a single absolute form.

/// Loopback base the store is known to mint during development.
pub const DEFAULT_LOOPBACK_BASE: &str = "http://localhost:8080/";

/// Rewrites photo URLs onto a fixed remote base. Pure and deterministic:
/// same input, same output, for one configured base pair.
#[derive(Debug, Clone)]
pub struct PhotoUrlResolver {
    base_url: String,
    loopback_base_url: String,
}

impl PhotoUrlResolver {
    /// Both bases are expected to end with a slash; `Config` normalizes
    /// them before handing them over.
    pub fn new(base_url: impl Into<String>, loopback_base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            loopback_base_url: loopback_base_url.into(),
        }
    }

    /// Resolve a possibly-relative photo URL to an absolute one.
    ///
    /// Loopback-based URLs are re-based onto the remote base, keeping the
    /// remainder path. Other absolute http(s) URLs pass through unchanged.
    /// Anything else is treated as a relative path: a single leading slash
    /// is stripped and the remainder is appended to the base.
    pub fn resolve(&self, photo_url: &str) -> String {
        if let Some(rest) = photo_url.strip_prefix(self.loopback_base_url.as_str()) {
            return format!("{}{}", self.base_url, rest);
        }
        if photo_url.starts_with("http") {
            return photo_url.to_string();
        }
        let rest = photo_url.strip_prefix('/').unwrap_or(photo_url);
        format!("{}{}", self.base_url, rest)
    }
}
