//! Privilege vocabulary and endpoint rules of the icon repository.
//!
//! ```
//! use axum_privileges::{icon, privilege_set};
//! use http::Method;
//!
//! let table = icon::table().unwrap();
//! let uploader = privilege_set([icon::ADD_ICON_FILE]);
//!
//! assert!(table.is_authorized("/icon/cat/format/svg/size/24px", &Method::POST, Some(&uploader)));
//! assert!(!table.is_authorized("/icon", &Method::POST, Some(&uploader)));
//! ```

use crate::config::ConfigurationError;
use crate::rule::RuleEntry;
use crate::table::{PrivilegeTable, StaticRuleProvider};
use http::Method;

/// Create a new icon.
pub const CREATE_ICON: &str = "CREATE_ICON";
/// Rename or otherwise update an icon.
pub const UPDATE_ICON: &str = "UPDATE_ICON";
/// Upload an icon file in some format and size.
pub const ADD_ICON_FILE: &str = "ADD_ICON_FILE";
/// Delete a single icon file.
pub const REMOVE_ICON_FILE: &str = "REMOVE_ICON_FILE";
/// Delete an icon with all its files.
pub const REMOVE_ICON: &str = "REMOVE_ICON";
/// Tag an icon.
pub const ADD_TAG: &str = "ADD_TAG";
/// Remove a tag from an icon.
pub const REMOVE_TAG: &str = "REMOVE_TAG";

/// Every privilege the icon repository defines.
pub const ALL: [&str; 7] = [
    CREATE_ICON,
    UPDATE_ICON,
    ADD_ICON_FILE,
    REMOVE_ICON_FILE,
    REMOVE_ICON,
    ADD_TAG,
    REMOVE_TAG,
];

/// Pattern for `/icon`.
pub const ICON_PATTERN: &str = "^/icon$";
/// Pattern for `/icon/{id}/format/{format}/size/{size}`.
pub const ICON_FILE_PATTERN: &str = "^/icon/[^/]+/format/[^/]+/size/[^/]+$";

/// The icon repository's endpoint declarations.
///
/// Uploading an icon file is allowed to holders of either `CREATE_ICON` or
/// `ADD_ICON_FILE`.
pub fn rules() -> Vec<RuleEntry> {
    vec![
        RuleEntry::new(ICON_PATTERN, Method::POST, [CREATE_ICON]),
        RuleEntry::new(ICON_FILE_PATTERN, Method::POST, [CREATE_ICON, ADD_ICON_FILE]),
    ]
}

/// The declarations as a rule provider.
pub fn provider() -> StaticRuleProvider {
    StaticRuleProvider::new(rules())
}

/// The compiled icon repository table.
pub fn table() -> Result<PrivilegeTable, ConfigurationError> {
    PrivilegeTable::from_entries(rules())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::{privilege_set, PrivilegeSet};

    #[test]
    fn test_icon_rules_compile() {
        let table = table().unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_create_icon() {
        let table = table().unwrap();
        let creator = privilege_set([CREATE_ICON]);
        let nobody = PrivilegeSet::new();

        assert!(table.is_authorized("/icon", &Method::POST, Some(&creator)));
        assert!(!table.is_authorized("/icon", &Method::POST, Some(&nobody)));
        assert!(!table.is_authorized("/icon", &Method::POST, None));
        assert!(table.is_authorized("/icon", &Method::GET, Some(&nobody)));
    }

    #[test]
    fn test_add_icon_file_with_either_privilege() {
        let table = table().unwrap();
        let path = "/icon/foo/format/svg/size/24px";

        assert!(table.is_authorized(path, &Method::POST, Some(&privilege_set([ADD_ICON_FILE]))));
        assert!(table.is_authorized(path, &Method::POST, Some(&privilege_set([CREATE_ICON]))));
        assert!(!table.is_authorized(
            path,
            &Method::POST,
            Some(&privilege_set([REMOVE_ICON, REMOVE_TAG]))
        ));
    }

    #[test]
    fn test_undeclared_routes_are_unrestricted() {
        let table = table().unwrap();
        assert!(table.is_authorized("/icon/foo", &Method::DELETE, None));
        assert!(table.is_authorized("/icon/foo/format/svg/size/24px", &Method::DELETE, None));
    }

    #[test]
    fn test_vocabulary_is_distinct() {
        let all = privilege_set(ALL);
        assert_eq!(all.len(), ALL.len());
    }
}
