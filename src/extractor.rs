//! Caller privilege extraction from HTTP requests.
//!
//! Authentication is not this crate's concern: a session layer in front of
//! the middleware decides who the caller is. A [`PrivilegeExtractor`] is the
//! seam through which the middleware learns what that caller holds.
//!
//! - [`PrivilegeExtractionResult::Privileges`]: an authenticated session, possibly
//!   holding no privileges at all
//! - [`PrivilegeExtractionResult::Anonymous`]: no session
//!
//! ## Session objects in request extensions
//!
//! The usual integration reads a session value inserted by the
//! authentication middleware:
//!
//! ```
//! use axum_privileges::{privilege_set, ExtensionPrivilegeExtractor};
//!
//! #[derive(Clone)]
//! struct Session {
//!     username: String,
//!     privileges: Vec<String>,
//! }
//!
//! let extractor = ExtensionPrivilegeExtractor::<Session>::new(|session| {
//!     privilege_set(session.privileges.iter().map(String::as_str))
//! });
//! ```

use crate::privilege::{PrivilegeId, PrivilegeSet};
use http::Request;
use std::sync::Arc;

/// Result of privilege extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeExtractionResult {
    /// The caller is authenticated and holds these privileges.
    Privileges(PrivilegeSet),
    /// No session: the caller is unauthenticated.
    Anonymous,
    /// An error occurred during extraction.
    Error(String),
}

impl PrivilegeExtractionResult {
    /// The caller's privileges, or `None` when there is no usable session.
    ///
    /// Extraction errors are treated as "no session".
    pub fn into_caller(self) -> Option<PrivilegeSet> {
        match self {
            Self::Privileges(privileges) => Some(privileges),
            Self::Anonymous | Self::Error(_) => None,
        }
    }
}

/// Trait for extracting the caller's privileges from HTTP requests.
///
/// The trait is synchronous because the privileges are already attached to
/// the request (headers or extensions) by the time authorization runs.
///
/// # Example
/// ```
/// use axum_privileges::{PrivilegeExtractor, PrivilegeExtractionResult, privilege_set};
/// use http::Request;
///
/// /// Grants icon editors everything they need, based on a role header.
/// struct RoleHeaderExtractor;
///
/// impl<B> PrivilegeExtractor<B> for RoleHeaderExtractor {
///     fn extract_privileges(&self, request: &Request<B>) -> PrivilegeExtractionResult {
///         match request.headers().get("X-Role").and_then(|v| v.to_str().ok()) {
///             Some("ICON_EDITOR") => PrivilegeExtractionResult::Privileges(
///                 privilege_set(["CREATE_ICON", "UPDATE_ICON", "REMOVE_ICON"]),
///             ),
///             Some(_) => PrivilegeExtractionResult::Privileges(Default::default()),
///             None => PrivilegeExtractionResult::Anonymous,
///         }
///     }
/// }
/// ```
pub trait PrivilegeExtractor<B>: Send + Sync {
    /// Extract the caller's privileges from an HTTP request.
    fn extract_privileges(&self, request: &Request<B>) -> PrivilegeExtractionResult;
}

impl<B, T: PrivilegeExtractor<B>> PrivilegeExtractor<B> for Arc<T> {
    fn extract_privileges(&self, request: &Request<B>) -> PrivilegeExtractionResult {
        (**self).extract_privileges(request)
    }
}

impl<B, T: PrivilegeExtractor<B> + ?Sized> PrivilegeExtractor<B> for Box<T> {
    fn extract_privileges(&self, request: &Request<B>) -> PrivilegeExtractionResult {
        (**self).extract_privileges(request)
    }
}

/// Extract privileges from a comma-separated HTTP header.
///
/// A missing header means no session. A present header means an
/// authenticated caller, even when it lists no privileges.
///
/// Only use this behind a trusted proxy that sets the header itself.
///
/// # Example
/// ```
/// use axum_privileges::HeaderPrivilegeExtractor;
///
/// let extractor = HeaderPrivilegeExtractor::new("X-Privileges");
/// ```
#[derive(Debug, Clone)]
pub struct HeaderPrivilegeExtractor {
    header_name: String,
}

impl HeaderPrivilegeExtractor {
    /// Create a new header privilege extractor.
    pub fn new(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
        }
    }
}

impl Default for HeaderPrivilegeExtractor {
    fn default() -> Self {
        Self::new("X-Privileges")
    }
}

impl<B> PrivilegeExtractor<B> for HeaderPrivilegeExtractor {
    fn extract_privileges(&self, request: &Request<B>) -> PrivilegeExtractionResult {
        match request.headers().get(&self.header_name) {
            Some(value) => match value.to_str() {
                Ok(s) => PrivilegeExtractionResult::Privileges(
                    s.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PrivilegeId::from)
                        .collect(),
                ),
                Err(e) => PrivilegeExtractionResult::Error(format!(
                    "header {} is not valid ASCII: {}",
                    self.header_name, e
                )),
            },
            None => PrivilegeExtractionResult::Anonymous,
        }
    }
}

/// Extract privileges from a request extension.
///
/// The authentication middleware inserts a session value of type `T`; its
/// absence means the caller is unauthenticated.
pub struct ExtensionPrivilegeExtractor<T> {
    extract_fn: Box<dyn Fn(&T) -> PrivilegeSet + Send + Sync>,
}

impl<T> ExtensionPrivilegeExtractor<T> {
    /// Create a new extension privilege extractor.
    ///
    /// The `extract_fn` reads the privilege set out of the session value.
    pub fn new<F>(extract_fn: F) -> Self
    where
        F: Fn(&T) -> PrivilegeSet + Send + Sync + 'static,
    {
        Self {
            extract_fn: Box::new(extract_fn),
        }
    }
}

impl<T> std::fmt::Debug for ExtensionPrivilegeExtractor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPrivilegeExtractor")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<B, T: Clone + Send + Sync + 'static> PrivilegeExtractor<B> for ExtensionPrivilegeExtractor<T> {
    fn extract_privileges(&self, request: &Request<B>) -> PrivilegeExtractionResult {
        match request.extensions().get::<T>() {
            Some(session) => PrivilegeExtractionResult::Privileges((self.extract_fn)(session)),
            None => PrivilegeExtractionResult::Anonymous,
        }
    }
}

/// An extractor that always returns the same privileges.
///
/// Useful for testing.
#[derive(Debug, Clone)]
pub struct FixedPrivilegeExtractor {
    privileges: PrivilegeSet,
}

impl FixedPrivilegeExtractor {
    /// Create a new fixed privilege extractor.
    pub fn new(privileges: PrivilegeSet) -> Self {
        Self { privileges }
    }
}

impl<B> PrivilegeExtractor<B> for FixedPrivilegeExtractor {
    fn extract_privileges(&self, _request: &Request<B>) -> PrivilegeExtractionResult {
        PrivilegeExtractionResult::Privileges(self.privileges.clone())
    }
}

/// An extractor that always reports an unauthenticated caller.
#[derive(Debug, Clone, Default)]
pub struct AnonymousPrivilegeExtractor;

impl AnonymousPrivilegeExtractor {
    /// Create a new anonymous privilege extractor.
    pub fn new() -> Self {
        Self
    }
}

impl<B> PrivilegeExtractor<B> for AnonymousPrivilegeExtractor {
    fn extract_privileges(&self, _request: &Request<B>) -> PrivilegeExtractionResult {
        PrivilegeExtractionResult::Anonymous
    }
}

/// A composite extractor that tries multiple extractors in order.
///
/// Returns the first successful extraction, or anonymous if all fail.
/// Privileges from multiple extractors are NOT combined.
pub struct ChainedPrivilegeExtractor<B> {
    extractors: Vec<Box<dyn PrivilegeExtractor<B>>>,
}

impl<B> ChainedPrivilegeExtractor<B> {
    /// Create a new chained extractor.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Add an extractor to the chain.
    pub fn add<E: PrivilegeExtractor<B> + 'static>(mut self, extractor: E) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }
}

impl<B> Default for ChainedPrivilegeExtractor<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> std::fmt::Debug for ChainedPrivilegeExtractor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedPrivilegeExtractor")
            .field("extractors_count", &self.extractors.len())
            .finish()
    }
}

impl<B> PrivilegeExtractor<B> for ChainedPrivilegeExtractor<B> {
    fn extract_privileges(&self, request: &Request<B>) -> PrivilegeExtractionResult {
        for extractor in &self.extractors {
            match extractor.extract_privileges(request) {
                PrivilegeExtractionResult::Privileges(p) => {
                    return PrivilegeExtractionResult::Privileges(p)
                }
                PrivilegeExtractionResult::Error(e) => {
                    tracing::warn!(error = %e, "Privilege extractor failed, trying next");
                }
                PrivilegeExtractionResult::Anonymous => continue,
            }
        }
        PrivilegeExtractionResult::Anonymous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::privilege_set;
    use http::{HeaderValue, Request};

    #[test]
    fn test_header_extractor_list() {
        let extractor = HeaderPrivilegeExtractor::default();

        let req = Request::builder()
            .header("X-Privileges", "CREATE_ICON, ADD_ICON_FILE,,")
            .body(())
            .unwrap();

        assert_eq!(
            extractor.extract_privileges(&req),
            PrivilegeExtractionResult::Privileges(privilege_set(["ADD_ICON_FILE", "CREATE_ICON"]))
        );
    }

    #[test]
    fn test_header_extractor_empty_is_authenticated() {
        let extractor = HeaderPrivilegeExtractor::new("X-Privileges");

        let req = Request::builder().header("X-Privileges", "").body(()).unwrap();

        assert_eq!(
            extractor.extract_privileges(&req).into_caller(),
            Some(PrivilegeSet::new())
        );
    }

    #[test]
    fn test_header_extractor_missing() {
        let extractor = HeaderPrivilegeExtractor::new("X-Privileges");

        let req = Request::builder().body(()).unwrap();

        assert_eq!(
            extractor.extract_privileges(&req),
            PrivilegeExtractionResult::Anonymous
        );
    }

    #[test]
    fn test_header_extractor_non_ascii() {
        let extractor = HeaderPrivilegeExtractor::new("X-Privileges");

        let mut req = Request::builder().body(()).unwrap();
        req.headers_mut().insert(
            "x-privileges",
            HeaderValue::from_bytes(b"CREATE_\xFFICON").unwrap(),
        );

        let result = extractor.extract_privileges(&req);
        assert!(matches!(result, PrivilegeExtractionResult::Error(_)));
        assert_eq!(result.into_caller(), None);
    }

    #[derive(Clone)]
    struct Session {
        privileges: Vec<&'static str>,
    }

    #[test]
    fn test_extension_extractor() {
        let extractor =
            ExtensionPrivilegeExtractor::<Session>::new(|s| privilege_set(s.privileges.iter().copied()));

        let mut req = Request::builder().body(()).unwrap();
        assert_eq!(
            extractor.extract_privileges(&req),
            PrivilegeExtractionResult::Anonymous
        );

        req.extensions_mut().insert(Session {
            privileges: vec!["REMOVE_ICON"],
        });
        assert_eq!(
            extractor.extract_privileges(&req),
            PrivilegeExtractionResult::Privileges(privilege_set(["REMOVE_ICON"]))
        );
    }

    #[test]
    fn test_chained_extractor() {
        let extractor = ChainedPrivilegeExtractor::new()
            .add(AnonymousPrivilegeExtractor::new())
            .add(HeaderPrivilegeExtractor::default())
            .add(FixedPrivilegeExtractor::new(privilege_set(["FALLBACK"])));

        let with_header = Request::builder()
            .header("X-Privileges", "ADD_TAG")
            .body(())
            .unwrap();
        assert_eq!(
            extractor.extract_privileges(&with_header),
            PrivilegeExtractionResult::Privileges(privilege_set(["ADD_TAG"]))
        );

        let without_header = Request::builder().body(()).unwrap();
        assert_eq!(
            extractor.extract_privileges(&without_header),
            PrivilegeExtractionResult::Privileges(privilege_set(["FALLBACK"]))
        );
    }
}
