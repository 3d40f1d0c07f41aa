//! Core types shared by every Fleetgate layer.
//!
//! Identity (who), capabilities (what they may reach), and outcomes (what
//! the gate decided). These are plain data: no I/O, no clocks, no cookies.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user row.
///
/// Newtype over `u64` so a user id can never be confused with a vehicle
/// id or a log id elsewhere in the application. Serialized as the bare
/// number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A user's role.
///
/// Role and permissions are layered: `Admin` satisfies every capability
/// check no matter what the explicit permission list says; `Standard` is
/// checked against the list only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every area.
    Admin,

    /// Access limited to the explicit permission list.
    #[default]
    Standard,
}

impl Role {
    /// Returns `true` for [`Role::Admin`].
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "standard" => Ok(Self::Standard),
            other => Err(ProtocolError::InvalidValue(format!(
                "unknown role {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability keys
// ---------------------------------------------------------------------------

/// Lower-cases a capability key for comparison.
///
/// Every comparison between a required key and a granted key goes through
/// this function, so `/Vehicles` and `/vehicles` are the same capability.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

/// The fixed set of protected areas in the fleet application.
///
/// Page handlers pass exactly one of these to the access gate. The gate
/// itself works on strings, so a key outside this list is not rejected;
/// it simply never appears in anyone's permission list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKey {
    Dashboard,
    Vehicles,
    Maintenance,
    Fueling,
    /// The phone-sized fueling form used at the pump. The only key the
    /// kiosk scope cookie can unlock.
    FuelingMobile,
    Reports,
    Alerts,
    Users,
    Settings,
}

impl CapabilityKey {
    /// Every known key, in navigation order.
    pub const ALL: [CapabilityKey; 9] = [
        Self::Dashboard,
        Self::Vehicles,
        Self::Maintenance,
        Self::Fueling,
        Self::FuelingMobile,
        Self::Reports,
        Self::Alerts,
        Self::Users,
        Self::Settings,
    ];

    /// The canonical string form, which is also the page path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "/dashboard",
            Self::Vehicles => "/vehicles",
            Self::Maintenance => "/maintenance",
            Self::Fueling => "/fueling",
            Self::FuelingMobile => "/fueling-mobile",
            Self::Reports => "/reports",
            Self::Alerts => "/alerts",
            Self::Users => "/users",
            Self::Settings => "/settings",
        }
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityKey {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| {
                ProtocolError::InvalidValue(format!(
                    "unknown capability key {s:?}"
                ))
            })
    }
}

impl AsRef<str> for CapabilityKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ---------------------------------------------------------------------------
// PermissionSet
// ---------------------------------------------------------------------------

/// An order-irrelevant set of capability keys, stored lower-cased.
///
/// Entries are normalized on the way in and lookups normalize the probe,
/// so mismatched casing on either side never causes a false denial.
/// Serialized as a plain JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key (normalized). Returns `false` if it was already present.
    pub fn insert(&mut self, key: impl AsRef<str>) -> bool {
        self.0.insert(normalize_key(key.as_ref()))
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.0.contains(&normalize_key(key.as_ref()))
    }

    /// Iterates over the normalized keys.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl From<Vec<String>> for PermissionSet {
    fn from(keys: Vec<String>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<PermissionSet> for Vec<String> {
    fn from(set: PermissionSet) -> Self {
        set.0.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// UserIdentity / Grants
// ---------------------------------------------------------------------------

/// An authenticated user, as resolved from a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// The permission list as it was when the session was resolved.
    /// The access gate re-reads it rather than trusting this copy.
    pub permissions: PermissionSet,
}

/// The effective capability set of a user: role plus explicit list.
///
/// This is what the permission resolver returns after re-reading the
/// user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    pub role: Role,
    pub permissions: PermissionSet,
}

impl Grants {
    /// Grants for an admin. The permission list is irrelevant.
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            permissions: PermissionSet::new(),
        }
    }

    /// Grants for a standard user with the given keys.
    pub fn standard<S: AsRef<str>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            role: Role::Standard,
            permissions: keys.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// The result of an authorization check.
///
/// These are the only externally observable outcomes. Nothing else (no
/// store error, no stack trace) ever reaches the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessOutcome {
    /// Proceed with the request.
    Allow,

    /// Not authenticated: send the browser to the login page, which will
    /// return it to `next` after a successful login.
    Login { next: String },

    /// Authenticated but not authorized. Carries no parameters.
    Forbidden,
}

impl AccessOutcome {
    /// Returns `true` for [`AccessOutcome::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// The per-request authorization state machine.
///
/// ```text
///   request ──→ Unauthenticated                 (no identity)
///          └──→ Authenticated ──→ Allowed       (admin / listed / kiosk)
///                            └──→ Denied        (everything else)
/// ```
///
/// Transitions are one-shot: every request starts over, nothing is
/// remembered between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Unauthenticated,
    Denied,
    Allowed,
}

impl From<&AccessOutcome> for AccessState {
    fn from(outcome: &AccessOutcome) -> Self {
        match outcome {
            AccessOutcome::Allow => Self::Allowed,
            AccessOutcome::Login { .. } => Self::Unauthenticated,
            AccessOutcome::Forbidden => Self::Denied,
        }
    }
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Denied => write!(f, "denied"),
            Self::Allowed => write!(f, "allowed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(42).to_string(), "U-42");
    }

    #[test]
    fn test_role_from_str_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("STANDARD".parse::<Role>().unwrap(), Role::Standard);
        assert!(matches!(
            "owner".parse::<Role>(),
            Err(ProtocolError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_capability_key_from_str_accepts_any_casing() {
        assert_eq!(
            "/Fueling-Mobile".parse::<CapabilityKey>().unwrap(),
            CapabilityKey::FuelingMobile
        );
        assert_eq!(
            "/REPORTS".parse::<CapabilityKey>().unwrap(),
            CapabilityKey::Reports
        );
    }

    #[test]
    fn test_capability_key_from_str_rejects_unknown() {
        assert!("/payroll".parse::<CapabilityKey>().is_err());
        // Keys are paths; the bare word is not a key.
        assert!("vehicles".parse::<CapabilityKey>().is_err());
    }

    #[test]
    fn test_capability_key_all_round_trips_through_as_str() {
        for key in CapabilityKey::ALL {
            assert_eq!(key.as_str().parse::<CapabilityKey>().unwrap(), key);
            assert!(key.as_str().starts_with('/'));
        }
    }

    #[test]
    fn test_permission_set_contains_ignores_case() {
        let perms: PermissionSet =
            ["/Vehicles", "/fueling"].into_iter().collect();

        assert!(perms.contains("/vehicles"));
        assert!(perms.contains("/VEHICLES"));
        assert!(perms.contains("/Fueling"));
        assert!(!perms.contains("/reports"));
    }

    #[test]
    fn test_permission_set_insert_deduplicates_across_case() {
        let mut perms = PermissionSet::new();
        assert!(perms.insert("/Reports"));
        assert!(!perms.insert("/reports"));
        assert_eq!(perms.len(), 1);
    }

    #[test]
    fn test_permission_set_accepts_capability_keys() {
        let perms: PermissionSet =
            [CapabilityKey::Alerts, CapabilityKey::Users].into_iter().collect();
        assert!(perms.contains(CapabilityKey::Alerts));
        assert!(perms.contains("/users"));
    }

    #[test]
    fn test_grants_constructors() {
        let admin = Grants::admin();
        assert!(admin.role.is_admin());
        assert!(admin.permissions.is_empty());

        let standard = Grants::standard(["/vehicles"]);
        assert_eq!(standard.role, Role::Standard);
        assert!(standard.permissions.contains("/vehicles"));
    }

    #[test]
    fn test_access_state_from_outcome() {
        assert_eq!(
            AccessState::from(&AccessOutcome::Allow),
            AccessState::Allowed
        );
        assert_eq!(
            AccessState::from(&AccessOutcome::Login { next: "/x".into() }),
            AccessState::Unauthenticated
        );
        assert_eq!(
            AccessState::from(&AccessOutcome::Forbidden),
            AccessState::Denied
        );
    }
}
