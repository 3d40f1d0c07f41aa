//! The authorization rules, as pure functions.
//!
//! Nothing in this module touches a store, a clock, or a request. Given
//! the same grants, key, and scope cookie, [`decide`] always returns the
//! same state.

use fleetgate_protocol::{AccessState, CapabilityKey, Grants, normalize_key};

/// The only capability the kiosk scope cookie can unlock.
pub const KIOSK_KEY: CapabilityKey = CapabilityKey::FuelingMobile;

/// The exact scope cookie value that unlocks [`KIOSK_KEY`].
/// Compared byte-for-byte: `Fueling-Only` is not the sentinel.
pub const KIOSK_SENTINEL: &str = "fueling-only";

/// Returns `true` if the grants cover `key`.
///
/// Admins are covered for every key, including keys nobody has heard of.
/// Standard users are covered if the key is in their list, compared
/// case-insensitively.
pub fn has_capability(grants: &Grants, key: &str) -> bool {
    grants.role.is_admin() || grants.permissions.contains(key)
}

/// The kiosk carve-out.
///
/// Returns `true` only if `key` is the mobile fueling capability (in any
/// casing) AND the scope cookie carries exactly [`KIOSK_SENTINEL`]. Any
/// other cookie value is treated as if no cookie were sent.
pub fn kiosk_allows(key: &str, scope_cookie: Option<&str>) -> bool {
    normalize_key(key) == KIOSK_KEY.as_str() && scope_cookie == Some(KIOSK_SENTINEL)
}

/// Decides the authorization state for one request.
///
/// `grants` is `None` when no identity resolved, or when the grants could
/// not be read; both are unauthenticated.
///
/// Order of checks:
/// 1. no grants → `Unauthenticated`
/// 2. admin, or key in the permission list → `Allowed`
/// 3. kiosk carve-out applies → `Allowed`
/// 4. otherwise → `Denied`
pub fn decide(grants: Option<&Grants>, key: &str, scope_cookie: Option<&str>) -> AccessState {
    let Some(grants) = grants else {
        return AccessState::Unauthenticated;
    };
    if has_capability(grants, key) || kiosk_allows(key, scope_cookie) {
        AccessState::Allowed
    } else {
        AccessState::Denied
    }
}
