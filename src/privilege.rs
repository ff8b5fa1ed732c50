//! Privilege identifiers and privilege sets.
//!
//! A [`PrivilegeId`] is an opaque token drawn from a vocabulary defined by the
//! application (see [`crate::icon`] for the icon repository's). The engine never
//! interprets privileges; it only compares them for equality.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// An opaque privilege identifier, e.g. `CREATE_ICON`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivilegeId(String);

impl PrivilegeId {
    /// Create a privilege identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrivilegeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrivilegeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PrivilegeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for PrivilegeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PrivilegeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PrivilegeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A set of privileges: either required by an endpoint or held by a caller.
pub type PrivilegeSet = BTreeSet<PrivilegeId>;

/// Build a [`PrivilegeSet`] from anything yielding privilege-like values.
///
/// ```
/// use axum_privileges::privilege_set;
///
/// let held = privilege_set(["CREATE_ICON", "ADD_TAG"]);
/// assert!(held.contains("ADD_TAG"));
/// ```
pub fn privilege_set<I, P>(privileges: I) -> PrivilegeSet
where
    I: IntoIterator<Item = P>,
    P: Into<PrivilegeId>,
{
    privileges.into_iter().map(Into::into).collect()
}

/// Any-of check: true when `held` contains at least one of `required`.
#[inline]
pub fn holds_any(required: &PrivilegeSet, held: &PrivilegeSet) -> bool {
    // Iterate the smaller set and probe the larger one.
    if required.len() <= held.len() {
        required.iter().any(|p| held.contains(p))
    } else {
        held.iter().any(|p| required.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_id_compares_with_str() {
        let id = PrivilegeId::new("CREATE_ICON");
        assert_eq!(id, "CREATE_ICON");
        assert_eq!(id.to_string(), "CREATE_ICON");
        assert_ne!(id, PrivilegeId::from("create_icon"));
    }

    #[test]
    fn test_set_lookup_by_str() {
        let set = privilege_set(["A", "B"]);
        assert!(set.contains("A"));
        assert!(!set.contains("C"));
    }

    #[test]
    fn test_holds_any() {
        let required = privilege_set(["A", "B"]);
        assert!(holds_any(&required, &privilege_set(["A"])));
        assert!(holds_any(&required, &privilege_set(["B", "X", "Y"])));
        assert!(!holds_any(&required, &privilege_set(["C"])));
        assert!(!holds_any(&required, &PrivilegeSet::new()));
        assert!(!holds_any(&PrivilegeSet::new(), &privilege_set(["A"])));
    }

    #[test]
    fn test_serde_transparent() {
        let id: PrivilegeId = serde_json::from_str("\"ADD_TAG\"").unwrap();
        assert_eq!(id, "ADD_TAG");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ADD_TAG\"");
    }
}
