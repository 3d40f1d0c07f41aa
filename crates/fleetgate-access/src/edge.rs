//! The edge pre-filter: a cheap, store-free first pass over every request.
//!
//! It answers one question: "could this request possibly be
//! authenticated?" A public path always could; any other path needs the
//! session cookie to exist. Whether the cookie is *valid* is the access
//! gate's problem, not this one's.
//!
//! Because it performs no I/O, the filter cannot fail at runtime. A wrong
//! allow-list is its only failure mode, and that is caught (as far as it
//! can be) by [`AccessConfig::validate`](crate::AccessConfig::validate).

use crate::AccessConfig;

/// What the edge filter decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeVerdict {
    /// Hand the request to the route handler.
    Continue,

    /// Send the browser to `location` (the login page with `next` set).
    RedirectLogin { location: String },
}

/// Store-free pre-filter over request paths.
#[derive(Debug, Clone)]
pub struct EdgeFilter {
    config: AccessConfig,
}

impl EdgeFilter {
    /// Creates a filter over the given config's allow-list and login path.
    pub fn new(config: AccessConfig) -> Self {
        Self { config }
    }

    /// Returns `true` if `path` is covered by the login path or a public
    /// prefix.
    pub fn is_public(&self, path: &str) -> bool {
        prefix_matches(&self.config.login_path, path)
            || self
                .config
                .public_prefixes
                .iter()
                .any(|prefix| prefix_matches(prefix, path))
    }

    /// Checks one request.
    ///
    /// `session_cookie` is the raw cookie value if the cookie was sent at
    /// all. Only its presence matters here.
    pub fn check(&self, path: &str, session_cookie: Option<&str>) -> EdgeVerdict {
        if self.is_public(path) || session_cookie.is_some() {
            return EdgeVerdict::Continue;
        }

        tracing::debug!(%path, "no session cookie, redirecting to login");
        EdgeVerdict::RedirectLogin {
            location: login_location(&self.config.login_path, path),
        }
    }
}

/// Segment-aware prefix match: `/static` covers `/static` and
/// `/static/x`, but not `/statics`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        // "/" as a prefix would make everything public.
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Builds the login redirect target: `<login_path>?next=<path>`.
///
/// `next` is percent-encoded except for unreserved characters and `/`,
/// so `/maintenance` stays readable as `next=/maintenance`.
pub fn login_location(login_path: &str, next: &str) -> String {
    format!("{login_path}?next={}", encode_query_value(next))
}

fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~/".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> EdgeFilter {
        EdgeFilter::new(AccessConfig::default())
    }

    #[test]
    fn test_check_no_cookie_protected_path_redirects_with_next() {
        let verdict = filter().check("/maintenance", None);
        assert_eq!(
            verdict,
            EdgeVerdict::RedirectLogin {
                location: "/login?next=/maintenance".into()
            }
        );
    }

    #[test]
    fn test_check_no_cookie_every_capability_path_redirects() {
        for key in fleetgate_protocol::CapabilityKey::ALL {
            let verdict = filter().check(key.as_str(), None);
            assert_eq!(
                verdict,
                EdgeVerdict::RedirectLogin {
                    location: format!("/login?next={key}")
                },
                "{key} should require a cookie"
            );
        }
    }

    #[test]
    fn test_check_cookie_present_continues_regardless_of_value() {
        assert_eq!(filter().check("/reports", Some("garbage")), EdgeVerdict::Continue);
        assert_eq!(filter().check("/reports", Some("")), EdgeVerdict::Continue);
    }

    #[test]
    fn test_check_public_paths_continue_without_cookie() {
        for path in [
            "/login",
            "/login/reset",
            "/api/auth/callback",
            "/api/public/health",
            "/static/app.css",
            "/favicon.ico",
        ] {
            assert_eq!(filter().check(path, None), EdgeVerdict::Continue, "{path}");
        }
    }

    #[test]
    fn test_is_public_matches_whole_segments_only() {
        let f = filter();
        assert!(!f.is_public("/loginx"));
        assert!(!f.is_public("/statics/app.css"));
        assert!(!f.is_public("/api/publicity"));
        assert!(!f.is_public("/api"));
    }

    #[test]
    fn test_is_public_custom_login_path_always_public() {
        let config = AccessConfig {
            login_path: "/signin".into(),
            public_prefixes: vec![],
            ..AccessConfig::default()
        };
        let f = EdgeFilter::new(config);
        assert!(f.is_public("/signin"));
        assert!(!f.is_public("/login"));
    }

    #[test]
    fn test_prefix_root_only_matches_root() {
        assert!(prefix_matches("/", "/"));
        assert!(!prefix_matches("/", "/vehicles"));
    }

    #[test]
    fn test_login_location_encodes_query_breaking_characters() {
        assert_eq!(
            login_location("/login", "/vehicles/a b&c=d"),
            "/login?next=/vehicles/a%20b%26c%3Dd"
        );
        assert_eq!(login_location("/login", "/rapports/é"), "/login?next=/rapports/%C3%A9");
    }
}
