//! URL helpers for attribute validation and link repair.
//!
//! [URL Standard](https://url.spec.whatwg.org/)

/// Extract the scheme of an absolute URL, lowercased.
///
/// [URL Standard § 4.3](https://url.spec.whatwg.org/#url-parsing)
/// "An absolute-URL string is a URL-scheme string, followed by U+003A (:),
/// followed by a scheme-specific part."
///
/// A URL-scheme string is an ASCII alpha followed by ASCII alphanumerics,
/// U+002B (+), U+002D (-), or U+002E (.). Returns `None` for relative URLs
/// and for strings whose leading `:` is not preceded by a valid scheme.
#[must_use]
pub fn scheme_of(url: &str) -> Option<String> {
    let colon = url.find(':')?;
    let candidate = &url[..colon];
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(candidate.to_ascii_lowercase())
    } else {
        None
    }
}

/// Check a URL-valued attribute against a list of permitted schemes.
///
/// Relative URLs carry no scheme and are accepted when `allow_relative` is
/// set; protocol-relative URLs (`//host/path`) count as relative here because
/// they inherit the document's scheme. Scheme comparison is ASCII
/// case-insensitive.
#[must_use]
pub fn is_protocol_allowed(url: &str, allowed: &[String], allow_relative: bool) -> bool {
    match scheme_of(url) {
        Some(scheme) => allowed.iter().any(|a| a.eq_ignore_ascii_case(&scheme)),
        None => allow_relative,
    }
}

/// Resolve a potentially relative URL against a base URL.
///
/// # Algorithm
///
/// [§ 2.5 URLs](https://html.spec.whatwg.org/multipage/urls-and-fetching.html#resolving-urls)
///
/// STEP 1: "If url is an absolute URL, return url."
///
/// STEP 2: "Otherwise, resolve url relative to base."
///
/// NOTE: This is a simplified implementation. Full URL resolution requires
/// implementing the URL Standard's URL parsing algorithm; the cases below
/// cover the canonical-link and runtime-script URLs this pipeline emits.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    // STEP 1: Check if href is already absolute.
    if scheme_of(href).is_some() {
        return href.to_string();
    }

    // STEP 2: Resolve relative URL against base.
    let Some(base) = base_url else {
        return href.to_string();
    };

    if href.starts_with("//") {
        // Protocol-relative URL - prepend scheme from base
        if base.starts_with("https:") {
            format!("https:{href}")
        } else {
            format!("http:{href}")
        }
    } else if href.starts_with('/') {
        // Absolute path - join with origin
        base.find("://").map_or_else(
            || href.to_string(),
            |scheme_end| {
                let after_scheme = &base[scheme_end + 3..];
                after_scheme.find('/').map_or_else(
                    // No path in base, just append
                    || format!("{base}{href}"),
                    |path_start| {
                        let origin = &base[..scheme_end + 3 + path_start];
                        format!("{origin}{href}")
                    },
                )
            },
        )
    } else {
        // Relative path - join with base directory
        let base_dir = base.rsplit_once('/').map_or(base, |(dir, _)| dir);
        format!("{base_dir}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_of_absolute() {
        assert_eq!(scheme_of("https://example.com"), Some("https".to_string()));
        assert_eq!(scheme_of("MAILTO:a@b.c"), Some("mailto".to_string()));
        assert_eq!(
            scheme_of("data:image/png;base64,AAAA"),
            Some("data".to_string())
        );
    }

    #[test]
    fn test_scheme_of_relative() {
        assert_eq!(scheme_of("/path/img.jpg"), None);
        assert_eq!(scheme_of("img.jpg"), None);
        assert_eq!(scheme_of("//cdn.example.com/a.js"), None);
    }

    #[test]
    fn test_scheme_of_invalid_prefix() {
        // A colon preceded by a non-scheme string is not a scheme.
        assert_eq!(scheme_of("1:2"), None);
        assert_eq!(scheme_of("a b:c"), None);
    }

    #[test]
    fn test_protocol_allowed() {
        let allowed = vec!["https".to_string(), "http".to_string()];
        assert!(is_protocol_allowed("https://a.com/x", &allowed, false));
        assert!(is_protocol_allowed("relative/path", &allowed, true));
        assert!(!is_protocol_allowed("relative/path", &allowed, false));
        assert!(!is_protocol_allowed("javascript:alert(1)", &allowed, true));
    }

    #[test]
    fn test_resolve_absolute_path() {
        assert_eq!(
            resolve_url("/feed/amp/", Some("https://example.com/feed/")),
            "https://example.com/feed/amp/"
        );
    }

    #[test]
    fn test_resolve_protocol_relative() {
        assert_eq!(
            resolve_url("//cdn.ampproject.org/v0.js", Some("https://example.com/")),
            "https://cdn.ampproject.org/v0.js"
        );
    }
}
