//! # axum-privileges
//!
//! Privilege-based endpoint authorization middleware for [axum](https://docs.rs/axum) 0.8.
//!
//! Each rule maps an endpoint path pattern and an HTTP method to the set of
//! privileges required to invoke it:
//! - **Pattern**: regular expression, always matched against the whole path
//! - **Method**: `GET`, `POST`, `PUT`, `PATCH`, `DELETE`, ...
//! - **Privileges**: opaque identifiers such as `CREATE_ICON`
//!
//! ## Features
//!
//! - **Compile once** - patterns are compiled when the table is built; a
//!   malformed pattern fails the build, never a request
//! - **Union of matches** - every matching rule contributes its privileges
//! - **Any-of semantics** - holding one required privilege is enough
//! - **Default-allow** - undeclared `(path, method)` pairs need no privilege
//! - **401 vs 403** - missing session and insufficient privileges are told apart
//! - **Atomic reloads** - [`SharedPrivilegeTable`] swaps whole tables
//!
//! ## Quick Start
//!
//! ```no_run
//! use axum::{Router, routing::post};
//! use axum_privileges::{PrivilegeLayer, PrivilegeTable};
//! use http::Method;
//!
//! async fn create_icon() -> &'static str {
//!     "created"
//! }
//!
//! async fn add_icon_file() -> &'static str {
//!     "stored"
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let table = PrivilegeTable::builder()
//!         .add("^/icon$", Method::POST, ["CREATE_ICON"])
//!         // Either privilege is sufficient
//!         .add(
//!             "^/icon/[^/]+/format/[^/]+/size/[^/]+$",
//!             Method::POST,
//!             ["CREATE_ICON", "ADD_ICON_FILE"],
//!         )
//!         .build()
//!         .expect("privilege rules must compile");
//!
//!     let app = Router::new()
//!         .route("/icon", post(create_icon))
//!         .route("/icon/{id}/format/{format}/size/{size}", post(add_icon_file))
//!         .layer(PrivilegeLayer::new(table));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! ## Rule Evaluation
//!
//! 1. **Resolve**: every rule whose pattern matches the path and which declares
//!    the request method contributes its privileges; results are unioned
//! 2. **Decide**:
//!    - no required privileges: allowed, session or not
//!    - no session: denied as unauthenticated (401)
//!    - session holds any required privilege: allowed
//!    - otherwise: denied as forbidden (403)
//!
//! ```
//! use axum_privileges::{Decision, PrivilegeTable, privilege_set};
//! use http::Method;
//!
//! let table = PrivilegeTable::builder()
//!     .add("^/icon$", Method::POST, ["CREATE_ICON"])
//!     .build()
//!     .unwrap();
//!
//! let tagger = privilege_set(["ADD_TAG"]);
//! assert_eq!(table.authorize("/icon", &Method::POST, None), Decision::Unauthenticated);
//! assert_eq!(table.authorize("/icon", &Method::POST, Some(&tagger)), Decision::Forbidden);
//! assert_eq!(table.authorize("/icon", &Method::GET, None), Decision::Allowed);
//! ```
//!
//! ## Caller Privileges
//!
//! By default privileges are read from the `X-Privileges` header as a
//! comma-separated list. In most applications the authentication layer puts a
//! session into request extensions instead:
//!
//! ```
//! use axum_privileges::{
//!     privilege_set, ExtensionPrivilegeExtractor, PrivilegeLayer, PrivilegeTable,
//! };
//!
//! #[derive(Clone)]
//! struct Session {
//!     privileges: Vec<String>,
//! }
//!
//! let layer = PrivilegeLayer::new(PrivilegeTable::new()).with_extractor(
//!     ExtensionPrivilegeExtractor::<Session>::new(|s| {
//!         privilege_set(s.privileges.iter().map(String::as_str))
//!     }),
//! );
//! ```
//!
//! ## TOML Rules
//!
//! ```
//! use axum_privileges::PrivilegeTable;
//!
//! let table = PrivilegeTable::from_toml(r#"
//! [endpoints."^/icon$"]
//! POST = ["CREATE_ICON"]
//! "#).unwrap();
//! assert_eq!(table.len(), 1);
//! ```
//!
//! ## Custom Denied Response
//!
//! ```
//! use axum_privileges::{PrivilegeLayer, PrivilegeTable, JsonDeniedHandler};
//!
//! let layer = PrivilegeLayer::new(PrivilegeTable::new())
//!     .with_denied_handler(JsonDeniedHandler::new());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod extractor;
pub mod icon;
mod middleware;
mod privilege;
mod rule;
mod table;

// Re-export main types
pub use config::{ConfigurationError, PrivilegeConfig, RuleConfig, TomlFileRuleProvider};
pub use error::{AccessDenied, AccessDeniedHandler, DefaultDeniedHandler, DenialReason, JsonDeniedHandler};
pub use extractor::{
    AnonymousPrivilegeExtractor, ChainedPrivilegeExtractor, ExtensionPrivilegeExtractor,
    FixedPrivilegeExtractor, HeaderPrivilegeExtractor, PrivilegeExtractionResult, PrivilegeExtractor,
};
pub use middleware::{PrivilegeLayer, PrivilegeMiddleware};
pub use privilege::{holds_any, privilege_set, PrivilegeId, PrivilegeSet};
pub use rule::{parse_method, EndpointPattern, EndpointRule, RuleEntry};
pub use table::{
    Decision, PrivilegeRuleProvider, PrivilegeTable, PrivilegeTableBuilder, SharedPrivilegeTable,
    StaticRuleProvider,
};

/// Prelude module for convenient imports.
///
/// ```
/// use axum_privileges::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ConfigurationError;
    pub use crate::error::{AccessDenied, AccessDeniedHandler, DenialReason};
    pub use crate::extractor::{HeaderPrivilegeExtractor, PrivilegeExtractionResult, PrivilegeExtractor};
    pub use crate::middleware::PrivilegeLayer;
    pub use crate::privilege::{privilege_set, PrivilegeId, PrivilegeSet};
    pub use crate::rule::RuleEntry;
    pub use crate::table::{Decision, PrivilegeRuleProvider, PrivilegeTable, SharedPrivilegeTable};
}
