//! AMP runtime version metadata.
//!
//! The CDN serves the runtime and extensions both unversioned
//! (`/v0.js`) and pinned to a release (`/rtv/<version>/v0.js`). Pinning
//! keeps a page's scripts mutually consistent across a CDN rollout. The
//! version comes from one bounded remote fetch per process; any failure
//! falls back to the bundled unversioned paths and warns once, so the
//! remote can never fail a request.

use std::sync::OnceLock;
use std::time::Duration;

use amphora_common::warning::warn_once;
use amphora_sanitize::CDN_BASE;
use serde::Deserialize;
use thiserror::Error;

/// Where the CDN publishes the current runtime version.
const METADATA_URL: &str = "https://cdn.ampproject.org/rtv/metadata";

/// Upper bound on the metadata fetch; past this the bundled fallback wins.
const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// User agent for the metadata fetch.
const USER_AGENT: &str = concat!("amphora/", env!("CARGO_PKG_VERSION"));

static RUNTIME_VERSION: OnceLock<Option<String>> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct RtvMetadata {
    #[serde(rename = "ampRuntimeVersion")]
    amp_runtime_version: String,
}

#[derive(Debug, Error)]
enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed metadata: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The current runtime version, fetched once per process on first use.
/// `None` means the fetch failed and unversioned paths are in effect.
pub fn runtime_version() -> Option<&'static str> {
    RUNTIME_VERSION
        .get_or_init(|| match fetch_runtime_version() {
            Ok(version) => Some(version),
            Err(error) => {
                warn_once(
                    "Rtv",
                    &format!("runtime metadata fetch failed ({error}), using unversioned CDN paths"),
                );
                None
            }
        })
        .as_deref()
}

fn fetch_runtime_version() -> Result<String, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let body = client.get(METADATA_URL).send()?.error_for_status()?.text()?;
    let metadata: RtvMetadata = serde_json::from_str(&body)?;
    Ok(metadata.amp_runtime_version)
}

/// Pin a CDN script URL to the process's runtime version, when one is
/// known. Non-CDN and already-pinned URLs pass through.
#[must_use]
pub fn pinned_src(src: &str) -> String {
    match runtime_version() {
        Some(version) => pin_with(src, version),
        None => src.to_string(),
    }
}

fn pin_with(src: &str, version: &str) -> String {
    let Some(path) = src.strip_prefix(CDN_BASE) else {
        return src.to_string();
    };
    if path.starts_with("/rtv/") {
        return src.to_string();
    }
    format!("{CDN_BASE}/rtv/{version}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_rewrites_cdn_paths() {
        assert_eq!(
            pin_with("https://cdn.ampproject.org/v0.js", "012345"),
            "https://cdn.ampproject.org/rtv/012345/v0.js"
        );
        assert_eq!(
            pin_with("https://cdn.ampproject.org/v0/amp-video-0.1.js", "012345"),
            "https://cdn.ampproject.org/rtv/012345/v0/amp-video-0.1.js"
        );
    }

    #[test]
    fn test_pin_leaves_pinned_and_foreign_urls() {
        assert_eq!(
            pin_with("https://cdn.ampproject.org/rtv/9/v0.js", "012345"),
            "https://cdn.ampproject.org/rtv/9/v0.js"
        );
        assert_eq!(
            pin_with("https://example.com/v0.js", "012345"),
            "https://example.com/v0.js"
        );
    }

    #[test]
    fn test_metadata_shape_deserializes() {
        let metadata: RtvMetadata =
            serde_json::from_str("{\"ampRuntimeVersion\":\"012410292120000\"}").unwrap();
        assert_eq!(metadata.amp_runtime_version, "012410292120000");
    }
}
