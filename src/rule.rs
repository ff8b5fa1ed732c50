//! Endpoint rule definitions and matching logic.
//!
//! A rule associates a path pattern and an HTTP method with the privileges
//! required to invoke it:
//!
//! - **Pattern**: regular expression, always matched against the whole path
//! - **Method**: one HTTP verb per declaration
//! - **Privileges**: any one of them grants access; empty means unrestricted
//!
//! [`RuleEntry`] is the declarative, uncompiled form. [`EndpointRule`] is the
//! compiled form held by a [`PrivilegeTable`](crate::PrivilegeTable): one
//! compiled pattern with a per-method privilege mapping.

use crate::config::ConfigurationError;
use crate::privilege::{PrivilegeId, PrivilegeSet};
use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// A compiled endpoint path pattern with full-match semantics.
///
/// The source text is compiled as `^(?:source)$`, so `/icon` and `^/icon$`
/// are equivalent and neither matches `/icon/extra`.
#[derive(Clone)]
pub struct EndpointPattern {
    source: String,
    regex: Regex,
}

impl EndpointPattern {
    /// Compile a pattern.
    ///
    /// # Example
    /// ```
    /// use axum_privileges::EndpointPattern;
    ///
    /// let pattern = EndpointPattern::compile("/icon/[^/]+").unwrap();
    /// assert!(pattern.matches("/icon/cat"));
    /// assert!(!pattern.matches("/icon/cat/format/svg"));
    ///
    /// assert!(EndpointPattern::compile("/icon/(").is_err());
    /// ```
    pub fn compile(source: impl Into<String>) -> Result<Self, ConfigurationError> {
        let source = source.into();
        // Compile the bare source first so an unbalanced pattern cannot
        // escape the anchoring group below.
        if let Err(e) = Regex::new(&source) {
            return Err(ConfigurationError::InvalidPattern {
                pattern: source,
                source: e,
            });
        }
        match Regex::new(&format!("^(?:{})$", source)) {
            Ok(regex) => Ok(Self { source, regex }),
            Err(e) => Err(ConfigurationError::InvalidPattern {
                pattern: source,
                source: e,
            }),
        }
    }

    /// The pattern as written in the declaration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether the whole `path` matches this pattern.
    #[inline]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl fmt::Debug for EndpointPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EndpointPattern").field(&self.source).finish()
    }
}

impl fmt::Display for EndpointPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A compiled rule: one pattern and the privileges each method requires.
#[derive(Debug, Clone)]
pub struct EndpointRule {
    pub(crate) pattern: EndpointPattern,
    pub(crate) methods: HashMap<Method, PrivilegeSet>,
}

impl EndpointRule {
    pub(crate) fn new(pattern: EndpointPattern) -> Self {
        Self {
            pattern,
            methods: HashMap::new(),
        }
    }

    /// The compiled path pattern.
    pub fn pattern(&self) -> &EndpointPattern {
        &self.pattern
    }

    /// Privileges declared for `method`, if the rule covers it.
    pub fn privileges_for(&self, method: &Method) -> Option<&PrivilegeSet> {
        self.methods.get(method)
    }

    /// Iterate the `(method, privileges)` pairs of this rule.
    pub fn methods(&self) -> impl Iterator<Item = (&Method, &PrivilegeSet)> {
        self.methods.iter()
    }

    /// Privileges this rule requires of a request, or `None` if the rule
    /// does not apply to it.
    #[inline]
    pub fn matches(&self, path: &str, method: &Method) -> Option<&PrivilegeSet> {
        // Method lookup is cheaper than running the regex.
        let privileges = self.methods.get(method)?;
        self.pattern.matches(path).then_some(privileges)
    }

    /// Merge a declaration for `method` into this rule (set union).
    pub(crate) fn declare(&mut self, method: Method, privileges: PrivilegeSet) {
        self.methods.entry(method).or_default().extend(privileges);
    }
}

/// A single uncompiled declaration: pattern + method -> required privileges.
///
/// This is what rule providers and configuration sources produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    /// The path pattern source.
    pub pattern: String,
    /// The HTTP method the rule applies to.
    pub method: Method,
    /// Privileges required; any one of them grants access.
    pub privileges: PrivilegeSet,
}

impl RuleEntry {
    /// Create a new rule entry.
    ///
    /// # Example
    /// ```
    /// use axum_privileges::RuleEntry;
    /// use http::Method;
    ///
    /// let entry = RuleEntry::new("^/icon$", Method::POST, ["CREATE_ICON"]);
    /// assert_eq!(entry.privileges.len(), 1);
    /// ```
    pub fn new<I, P>(pattern: impl Into<String>, method: Method, privileges: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PrivilegeId>,
    {
        Self {
            pattern: pattern.into(),
            method,
            privileges: privileges.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an entry that requires no privilege.
    pub fn unrestricted(pattern: impl Into<String>, method: Method) -> Self {
        Self {
            pattern: pattern.into(),
            method,
            privileges: PrivilegeSet::new(),
        }
    }
}

/// Parse an HTTP method name as used in declarative sources.
///
/// Names are case-insensitive: `post` and `POST` are the same method.
pub fn parse_method(name: &str) -> Result<Method, ConfigurationError> {
    let upper = name.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(ConfigurationError::InvalidMethod(name.to_string()));
    }
    Method::from_bytes(upper.as_bytes())
        .map_err(|_| ConfigurationError::InvalidMethod(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::privilege_set;

    #[test]
    fn test_pattern_full_match() {
        let pattern = EndpointPattern::compile("^/icon$").unwrap();
        assert!(pattern.matches("/icon"));
        assert!(!pattern.matches("/icon/extra"));
        assert!(!pattern.matches("/prefix/icon"));
    }

    #[test]
    fn test_unanchored_pattern_is_anchored() {
        let pattern = EndpointPattern::compile("/icon").unwrap();
        assert!(pattern.matches("/icon"));
        assert!(!pattern.matches("/icon/extra"));
        assert!(!pattern.matches("/api/icon"));
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let pattern = EndpointPattern::compile("/icon|/tag").unwrap();
        assert!(pattern.matches("/icon"));
        assert!(pattern.matches("/tag"));
        assert!(!pattern.matches("/icon/x"));
        assert!(!pattern.matches("/x/tag"));
    }

    #[test]
    fn test_icon_file_pattern() {
        let pattern =
            EndpointPattern::compile("^/icon/[^/]+/format/[^/]+/size/[^/]+$").unwrap();
        assert!(pattern.matches("/icon/foo/format/svg/size/24px"));
        assert!(!pattern.matches("/icon/foo/format/svg/size/"));
        assert!(!pattern.matches("/icon/foo/bar/format/svg/size/24px"));
    }

    #[test]
    fn test_malformed_pattern() {
        match EndpointPattern::compile("/icon/(") {
            Err(ConfigurationError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "/icon/("),
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
        // Would compile once wrapped, must still be rejected.
        assert!(EndpointPattern::compile("a)(b").is_err());
    }

    #[test]
    fn test_rule_matches_method_and_path() {
        let mut rule = EndpointRule::new(EndpointPattern::compile("/icon").unwrap());
        rule.declare(Method::POST, privilege_set(["CREATE_ICON"]));

        assert_eq!(
            rule.matches("/icon", &Method::POST),
            Some(&privilege_set(["CREATE_ICON"]))
        );
        assert_eq!(rule.matches("/icon", &Method::GET), None);
        assert_eq!(rule.matches("/tag", &Method::POST), None);
    }

    #[test]
    fn test_declare_unions() {
        let mut rule = EndpointRule::new(EndpointPattern::compile("/icon").unwrap());
        rule.declare(Method::POST, privilege_set(["A"]));
        rule.declare(Method::POST, privilege_set(["B", "A"]));
        assert_eq!(rule.privileges_for(&Method::POST), Some(&privilege_set(["A", "B"])));
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("POST").unwrap(), Method::POST);
        assert_eq!(parse_method("patch").unwrap(), Method::PATCH);
        assert_eq!(parse_method(" Delete ").unwrap(), Method::DELETE);
        assert!(matches!(parse_method(""), Err(ConfigurationError::InvalidMethod(_))));
        assert!(matches!(parse_method("GE T"), Err(ConfigurationError::InvalidMethod(_))));
    }
}
