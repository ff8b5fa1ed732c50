//! Privilege table: compilation of endpoint rules and authorization decisions.
//!
//! The [`PrivilegeTable`] is the central data structure. It is compiled once
//! from declarations by [`PrivilegeTableBuilder`] and is immutable afterwards.
//! Evaluation is a linear scan over the compiled rules:
//!
//! 1. Every rule whose pattern matches the whole path **and** which declares
//!    the request method contributes its privileges.
//! 2. Contributions are combined with set union (no "first match wins").
//! 3. An empty result means the endpoint is unrestricted (default-allow).
//! 4. Otherwise the caller needs a session holding **any one** of the
//!    required privileges.
//!
//! For runtime reloads, [`SharedPrivilegeTable`] swaps whole tables atomically.

use crate::config::ConfigurationError;
use crate::privilege::{holds_any, PrivilegeId, PrivilegeSet};
use crate::rule::{EndpointPattern, EndpointRule, RuleEntry};
use http::Method;
use std::sync::{Arc, PoisonError, RwLock};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allowed,
    /// Privileges are required but the caller has no session (HTTP 401).
    Unauthenticated,
    /// The caller's session holds none of the required privileges (HTTP 403).
    Forbidden,
}

impl Decision {
    /// Check if this decision lets the request proceed.
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// A compiled, immutable table of endpoint privilege rules.
///
/// # Example
/// ```
/// use axum_privileges::{PrivilegeTable, privilege_set};
/// use http::Method;
///
/// let table = PrivilegeTable::builder()
///     .add("^/icon$", Method::POST, ["CREATE_ICON"])
///     .build()
///     .unwrap();
///
/// let caller = privilege_set(["CREATE_ICON"]);
/// assert!(table.is_authorized("/icon", &Method::POST, Some(&caller)));
/// assert!(!table.is_authorized("/icon", &Method::POST, None));
/// // No rule for GET: unrestricted.
/// assert!(table.is_authorized("/icon", &Method::GET, None));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrivilegeTable {
    /// Compiled rules, one per distinct pattern, in declaration order.
    pub(crate) rules: Vec<EndpointRule>,
}

impl PrivilegeTable {
    /// Create an empty table: every request is unrestricted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a table.
    pub fn builder() -> PrivilegeTableBuilder {
        PrivilegeTableBuilder::new()
    }

    /// Compile a table from a list of declarations.
    pub fn from_entries(
        entries: impl IntoIterator<Item = RuleEntry>,
    ) -> Result<Self, ConfigurationError> {
        Self::builder().add_entries(entries).build()
    }

    /// Load declarations from a provider and compile them.
    ///
    /// A provider failing with a [`ConfigurationError`] keeps that error's
    /// kind; any other error is reported as [`ConfigurationError::Provider`].
    pub fn from_provider<P: PrivilegeRuleProvider>(provider: &P) -> Result<Self, ConfigurationError> {
        let entries = provider
            .load_rules()
            .map_err(|e| {
                let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(e);
                match boxed.downcast::<ConfigurationError>() {
                    Ok(e) => *e,
                    Err(other) => ConfigurationError::Provider(other),
                }
            })?;
        Self::from_entries(entries)
    }

    /// The compiled rules.
    pub fn rules(&self) -> &[EndpointRule] {
        &self.rules
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Union of the privileges required by every rule matching the request.
    ///
    /// An empty set means no privilege is needed.
    ///
    /// # Example
    /// ```
    /// use axum_privileges::{PrivilegeTable, privilege_set};
    /// use http::Method;
    ///
    /// let table = PrivilegeTable::builder()
    ///     .add("^/icon/.*$", Method::DELETE, ["REMOVE_ICON"])
    ///     .add("^/icon/[^/]+$", Method::DELETE, ["ICON_ADMIN"])
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     table.required_privileges_for("/icon/cat", &Method::DELETE),
    ///     privilege_set(["ICON_ADMIN", "REMOVE_ICON"]),
    /// );
    /// assert!(table.required_privileges_for("/tag", &Method::DELETE).is_empty());
    /// ```
    pub fn required_privileges_for(&self, path: &str, method: &Method) -> PrivilegeSet {
        let mut required = PrivilegeSet::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            if let Some(privileges) = rule.matches(path, method) {
                tracing::debug!(
                    endpoint = %rule.pattern,
                    rule_index = idx,
                    method = %method,
                    path = path,
                    privileges = ?privileges,
                    "Privilege rule matched"
                );
                required.extend(privileges.iter().cloned());
            }
        }

        if required.is_empty() {
            tracing::debug!(
                path = path,
                method = %method,
                "No privilege required for endpoint"
            );
        }
        required
    }

    /// Decide whether a caller may invoke `method` on `path`.
    ///
    /// `caller` is `None` when the request has no authenticated session.
    pub fn authorize(&self, path: &str, method: &Method, caller: Option<&PrivilegeSet>) -> Decision {
        Self::decide(&self.required_privileges_for(path, method), caller)
    }

    /// Decide against an already resolved set of required privileges.
    ///
    /// Empty `required` always allows. Otherwise a session holding any one
    /// of the required privileges is allowed.
    pub fn decide(required: &PrivilegeSet, caller: Option<&PrivilegeSet>) -> Decision {
        if required.is_empty() {
            return Decision::Allowed;
        }
        match caller {
            None => Decision::Unauthenticated,
            Some(held) if holds_any(required, held) => Decision::Allowed,
            Some(_) => Decision::Forbidden,
        }
    }

    /// Check if the caller is authorized for the request.
    pub fn is_authorized(&self, path: &str, method: &Method, caller: Option<&PrivilegeSet>) -> bool {
        self.authorize(path, method, caller).is_allowed()
    }
}

/// Builder for constructing a [`PrivilegeTable`].
///
/// Declarations are collected as written and compiled by [`build`](Self::build),
/// which either compiles every pattern or fails without producing a table.
#[derive(Debug, Default)]
pub struct PrivilegeTableBuilder {
    entries: Vec<RuleEntry>,
}

impl PrivilegeTableBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require any of `privileges` for `method` on paths matching `pattern`.
    pub fn add<I, P>(mut self, pattern: impl Into<String>, method: Method, privileges: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PrivilegeId>,
    {
        self.entries.push(RuleEntry::new(pattern, method, privileges));
        self
    }

    /// Add a single declaration.
    pub fn add_entry(mut self, entry: RuleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Add multiple declarations.
    pub fn add_entries(mut self, entries: impl IntoIterator<Item = RuleEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Compile the declarations into a table.
    ///
    /// Declarations sharing a pattern string are grouped under one compiled
    /// pattern; repeated `(pattern, method)` declarations are unioned.
    pub fn build(self) -> Result<PrivilegeTable, ConfigurationError> {
        let declarations = self.entries.len();
        let mut rules: Vec<EndpointRule> = Vec::new();

        for entry in self.entries {
            let RuleEntry {
                pattern,
                method,
                privileges,
            } = entry;

            match rules.iter_mut().find(|r| r.pattern.as_str() == pattern) {
                Some(rule) => rule.declare(method, privileges),
                None => {
                    let mut rule = EndpointRule::new(EndpointPattern::compile(pattern)?);
                    rule.declare(method, privileges);
                    rules.push(rule);
                }
            }
        }

        tracing::info!(
            declarations = declarations,
            patterns = rules.len(),
            "Compiled privilege table"
        );

        Ok(PrivilegeTable { rules })
    }

    /// Build the table wrapped in a [`SharedPrivilegeTable`].
    pub fn build_shared(self) -> Result<SharedPrivilegeTable, ConfigurationError> {
        self.build().map(SharedPrivilegeTable::new)
    }
}

/// Trait for types that can provide privilege rule declarations.
///
/// Implement this trait to load rules from external sources such as
/// configuration files or a database.
///
/// # Example
/// ```
/// use axum_privileges::{PrivilegeRuleProvider, RuleEntry};
/// use http::Method;
///
/// struct IconRules;
///
/// impl PrivilegeRuleProvider for IconRules {
///     type Error = std::io::Error;
///
///     fn load_rules(&self) -> Result<Vec<RuleEntry>, Self::Error> {
///         Ok(vec![RuleEntry::new("^/icon$", Method::POST, ["CREATE_ICON"])])
///     }
/// }
/// ```
pub trait PrivilegeRuleProvider: Send + Sync {
    /// Error type for rule loading failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load rule declarations from the provider.
    fn load_rules(&self) -> Result<Vec<RuleEntry>, Self::Error>;
}

/// A simple rule provider that returns a static list of declarations.
#[derive(Debug, Clone)]
pub struct StaticRuleProvider {
    rules: Vec<RuleEntry>,
}

impl StaticRuleProvider {
    /// Create a new static rule provider.
    pub fn new(rules: Vec<RuleEntry>) -> Self {
        Self { rules }
    }
}

impl PrivilegeRuleProvider for StaticRuleProvider {
    type Error = std::convert::Infallible;

    fn load_rules(&self) -> Result<Vec<RuleEntry>, Self::Error> {
        Ok(self.rules.clone())
    }
}

/// A privilege table that can be replaced at runtime.
///
/// Readers take a [`snapshot`](Self::snapshot) and evaluate against it without
/// holding any lock, so an in-flight evaluation always sees one complete table.
/// Replacement swaps a single `Arc`.
#[derive(Debug, Clone)]
pub struct SharedPrivilegeTable {
    current: Arc<RwLock<Arc<PrivilegeTable>>>,
}

impl SharedPrivilegeTable {
    /// Wrap a compiled table.
    pub fn new(table: PrivilegeTable) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// The table currently in effect.
    pub fn snapshot(&self) -> Arc<PrivilegeTable> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a new table, returning the previous one.
    pub fn replace(&self, table: PrivilegeTable) -> Arc<PrivilegeTable> {
        let table = Arc::new(table);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *current, table);
        tracing::info!(
            previous_patterns = previous.len(),
            patterns = current.len(),
            "Privilege table replaced"
        );
        previous
    }

    /// Rebuild the table from a provider and install it.
    ///
    /// The new table is fully compiled before the swap; on error the current
    /// table stays in effect.
    pub fn reload<P: PrivilegeRuleProvider>(&self, provider: &P) -> Result<(), ConfigurationError> {
        match PrivilegeTable::from_provider(provider) {
            Ok(table) => {
                self.replace(table);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Privilege table reload failed, keeping current table");
                Err(e)
            }
        }
    }
}

impl From<PrivilegeTable> for SharedPrivilegeTable {
    fn from(table: PrivilegeTable) -> Self {
        Self::new(table)
    }
}
