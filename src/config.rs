//! TOML configuration support for privilege rules.
//!
//! Rules can be declared as a pattern-keyed mapping of methods to privilege
//! lists, as an ordered list of rule records, or both:
//!
//! ```toml
//! [endpoints."^/icon$"]
//! POST = ["CREATE_ICON"]
//!
//! [endpoints."^/icon/[^/]+/format/[^/]+/size/[^/]+$"]
//! POST = ["CREATE_ICON", "ADD_ICON_FILE"]
//!
//! [[rules]]
//! endpoint = "^/icon/[^/]+$"
//! methods = ["PUT", "PATCH"]
//! privileges = ["UPDATE_ICON"]
//! ```
//!
//! An empty privilege list declares an endpoint that needs no privilege.
//!
//! # Usage
//!
//! ## Compile-time embedded config
//!
//! ```ignore
//! use axum_privileges::PrivilegeTable;
//!
//! const PRIVILEGES: &str = include_str!("../privileges.toml");
//!
//! let table = PrivilegeTable::from_toml(PRIVILEGES)?;
//! ```
//!
//! ## Runtime file loading
//!
//! ```ignore
//! use axum_privileges::PrivilegeTable;
//!
//! let table = PrivilegeTable::from_toml_file("config/privileges.toml")?;
//! ```

use crate::privilege::PrivilegeId;
use crate::rule::{parse_method, EndpointPattern, RuleEntry};
use crate::table::{PrivilegeRuleProvider, PrivilegeTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Error raised when a privilege table cannot be built.
///
/// Every variant is fatal for the table being built: no partial table is
/// ever produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A path pattern is not a valid regular expression.
    #[error("Invalid endpoint pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// The underlying regex error.
        source: regex::Error,
    },

    /// A method name is not a valid HTTP method.
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// TOML parsing error.
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File I/O error.
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A rule provider failed to load its rules.
    #[error("Rule provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrivilegeConfig {
    /// Pattern -> method -> required privileges.
    #[serde(default)]
    pub endpoints: BTreeMap<String, BTreeMap<String, Vec<PrivilegeId>>>,
    /// Rule records, applied after `endpoints`.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// A single rule record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Endpoint path pattern (regular expression, full match).
    pub endpoint: String,

    /// HTTP methods the rule applies to. Must not be empty.
    pub methods: Vec<String>,

    /// Required privileges; any one of them grants access.
    #[serde(default)]
    pub privileges: Vec<PrivilegeId>,
}

impl PrivilegeConfig {
    /// Parse configuration from a TOML string.
    ///
    /// # Example
    /// ```
    /// use axum_privileges::PrivilegeConfig;
    ///
    /// let toml = r#"
    /// [endpoints."^/icon$"]
    /// POST = ["CREATE_ICON"]
    /// "#;
    ///
    /// let config = PrivilegeConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.entries().unwrap().len(), 1);
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigurationError> {
        let config = Self::parse(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize without compiling patterns. Callers that go on to build a
    /// table get the same pattern errors from the build.
    fn parse(toml_str: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(toml_str)?)
    }

    fn read(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Validate the configuration: every method name parses and every
    /// pattern compiles.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let entries = self.entries()?;
        let mut seen = HashSet::new();
        for entry in &entries {
            if seen.insert(entry.pattern.as_str()) {
                EndpointPattern::compile(entry.pattern.as_str())?;
            }
        }
        Ok(())
    }

    /// Flatten the configuration into rule declarations.
    pub fn entries(&self) -> Result<Vec<RuleEntry>, ConfigurationError> {
        let mut entries = Vec::new();

        for (pattern, methods) in &self.endpoints {
            for (method, privileges) in methods {
                entries.push(RuleEntry::new(
                    pattern.as_str(),
                    parse_method(method)?,
                    privileges.iter().cloned(),
                ));
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if rule.methods.is_empty() {
                return Err(ConfigurationError::Invalid(format!(
                    "Rule {} ('{}'): at least one method is required",
                    i, rule.endpoint
                )));
            }
            for method in &rule.methods {
                entries.push(RuleEntry::new(
                    rule.endpoint.as_str(),
                    parse_method(method)?,
                    rule.privileges.iter().cloned(),
                ));
            }
        }

        Ok(entries)
    }

    /// Compile the configuration into a [`PrivilegeTable`].
    pub fn into_table(self) -> Result<PrivilegeTable, ConfigurationError> {
        PrivilegeTable::from_entries(self.entries()?)
    }
}

impl PrivilegeRuleProvider for PrivilegeConfig {
    type Error = ConfigurationError;

    fn load_rules(&self) -> Result<Vec<RuleEntry>, Self::Error> {
        self.entries()
    }
}

/// A rule provider that re-reads a TOML file on every load.
///
/// Pair it with [`SharedPrivilegeTable::reload`](crate::SharedPrivilegeTable::reload)
/// to pick up edits without restarting.
#[derive(Debug, Clone)]
pub struct TomlFileRuleProvider {
    path: PathBuf,
}

impl TomlFileRuleProvider {
    /// Create a provider for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this provider reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrivilegeRuleProvider for TomlFileRuleProvider {
    type Error = ConfigurationError;

    fn load_rules(&self) -> Result<Vec<RuleEntry>, Self::Error> {
        tracing::debug!(path = %self.path.display(), "Loading privilege rules");
        PrivilegeConfig::read(&self.path)?.entries()
    }
}

impl PrivilegeTable {
    /// Create a table from a TOML configuration string.
    ///
    /// # Example
    /// ```
    /// use axum_privileges::{PrivilegeTable, privilege_set};
    /// use http::Method;
    ///
    /// const CONFIG: &str = r#"
    /// [endpoints."^/icon$"]
    /// POST = ["CREATE_ICON"]
    ///
    /// [endpoints."^/icon/[^/]+/format/[^/]+/size/[^/]+$"]
    /// POST = ["CREATE_ICON", "ADD_ICON_FILE"]
    /// "#;
    ///
    /// let table = PrivilegeTable::from_toml(CONFIG).unwrap();
    /// let caller = privilege_set(["ADD_ICON_FILE"]);
    /// assert!(table.is_authorized("/icon/foo/format/svg/size/24px", &Method::POST, Some(&caller)));
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigurationError> {
        PrivilegeConfig::parse(toml_str)?.into_table()
    }

    /// Create a table from a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        PrivilegeConfig::read(path)?.into_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::privilege_set;
    use http::Method;

    #[test]
    fn test_parse_endpoint_mapping() {
        let toml = r#"
[endpoints."^/icon$"]
POST = ["CREATE_ICON"]

[endpoints."^/icon/[^/]+/format/[^/]+/size/[^/]+$"]
POST = ["CREATE_ICON", "ADD_ICON_FILE"]
"#;

        let config = PrivilegeConfig::from_toml(toml).unwrap();
        assert_eq!(config.endpoints.len(), 2);

        let table = config.into_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.required_privileges_for("/icon/x/format/png/size/18px", &Method::POST),
            privilege_set(["ADD_ICON_FILE", "CREATE_ICON"])
        );
    }

    #[test]
    fn test_parse_rule_records() {
        let toml = r#"
[[rules]]
endpoint = "^/icon/[^/]+$"
methods = ["put", "PATCH"]
privileges = ["UPDATE_ICON"]

[[rules]]
endpoint = "^/health$"
methods = ["GET"]
"#;

        let table = PrivilegeTable::from_toml(toml).unwrap();
        let updater = privilege_set(["UPDATE_ICON"]);

        assert!(!table.is_authorized("/icon/cat", &Method::PUT, None));
        assert!(table.is_authorized("/icon/cat", &Method::PATCH, Some(&updater)));
        assert!(table.is_authorized("/health", &Method::GET, None));
    }

    #[test]
    fn test_mapping_and_records_combine() {
        let toml = r#"
[endpoints."^/icon$"]
POST = ["CREATE_ICON"]

[[rules]]
endpoint = "^/icon$"
methods = ["POST"]
privileges = ["ICON_ADMIN"]
"#;

        let table = PrivilegeTable::from_toml(toml).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.required_privileges_for("/icon", &Method::POST),
            privilege_set(["CREATE_ICON", "ICON_ADMIN"])
        );
    }

    #[test]
    fn test_invalid_pattern_rejected_at_load() {
        let toml = r#"
[endpoints."^/icon/(unclosed$"]
POST = ["CREATE_ICON"]
"#;

        match PrivilegeConfig::from_toml(toml) {
            Err(ConfigurationError::InvalidPattern { pattern, .. }) => {
                assert_eq!(pattern, "^/icon/(unclosed$")
            }
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_method_rejected() {
        let toml = r#"
[endpoints."^/icon$"]
"PO ST" = ["CREATE_ICON"]
"#;

        assert!(matches!(
            PrivilegeConfig::from_toml(toml),
            Err(ConfigurationError::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_rule_without_methods_rejected() {
        let toml = r#"
[[rules]]
endpoint = "^/icon$"
methods = []
privileges = ["CREATE_ICON"]
"#;

        assert!(matches!(
            PrivilegeConfig::from_toml(toml),
            Err(ConfigurationError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            PrivilegeConfig::from_toml("[endpoints"),
            Err(ConfigurationError::TomlParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let provider = TomlFileRuleProvider::new("/nonexistent/privileges.toml");
        assert!(matches!(
            provider.load_rules(),
            Err(ConfigurationError::FileRead(_))
        ));
    }

    #[test]
    fn test_file_provider_errors_keep_their_kind() {
        let provider = TomlFileRuleProvider::new("/nonexistent/privileges.toml");
        assert!(matches!(
            PrivilegeTable::from_provider(&provider),
            Err(ConfigurationError::FileRead(_))
        ));

        let path = std::env::temp_dir().join(format!(
            "axum-privileges-bad-pattern-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[endpoints.\"^/icon/(\"]\nPOST = [\"CREATE_ICON\"]\n").unwrap();
        let result = PrivilegeTable::from_provider(&TomlFileRuleProvider::new(&path));
        std::fs::remove_file(&path).unwrap();

        match result {
            Err(ConfigurationError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "^/icon/("),
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_table_from_toml_reports_invalid_pattern() {
        let toml = r#"
[endpoints."^/icon/(unclosed$"]
POST = ["CREATE_ICON"]
"#;

        assert!(matches!(
            PrivilegeTable::from_toml(toml),
            Err(ConfigurationError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PrivilegeTable::from_toml("[endpoints.\"^/icon$\"]\n\"PO ST\" = []\n"),
            Err(ConfigurationError::InvalidMethod(_))
        ));
    }
}
