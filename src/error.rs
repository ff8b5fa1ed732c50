//! Denied-request types and responses for the privilege middleware.

use crate::privilege::{PrivilegeId, PrivilegeSet};
use axum::response::{IntoResponse, Response};
use http::{Method, StatusCode};
use std::fmt;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The endpoint requires privileges and there is no session.
    Unauthenticated,
    /// The session holds none of the required privileges.
    Forbidden,
}

impl DenialReason {
    /// The HTTP status conventionally used for this reason.
    pub fn status(self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

/// A refused request, handed to an [`AccessDeniedHandler`].
#[derive(Debug, Clone)]
pub struct AccessDenied {
    /// Why the request was refused.
    pub reason: DenialReason,
    /// The request method.
    pub method: Method,
    /// The path that was requested.
    pub path: String,
    /// Privileges the endpoint requires (any one suffices).
    pub required: PrivilegeSet,
    /// Optional custom message.
    pub message: Option<String>,
}

impl AccessDenied {
    /// Create a new access denied value.
    pub fn new(
        reason: DenialReason,
        method: Method,
        path: impl Into<String>,
        required: PrivilegeSet,
    ) -> Self {
        Self {
            reason,
            method,
            path: path.into(),
            required,
            message: None,
        }
    }

    /// Add a custom message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The HTTP status for this denial.
    pub fn status(&self) -> StatusCode {
        self.reason.status()
    }

    fn default_message(&self) -> &'static str {
        match self.reason {
            DenialReason::Unauthenticated => "Authentication required",
            DenialReason::Forbidden => "Access denied",
        }
    }
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}", msg),
            None => {
                let required: Vec<&str> = self.required.iter().map(PrivilegeId::as_str).collect();
                write!(
                    f,
                    "{} for {} {} (requires any of: {})",
                    self.default_message(),
                    self.method,
                    self.path,
                    required.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for AccessDenied {}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let body = match &self.message {
            Some(msg) => msg.clone(),
            None => self.default_message().to_string(),
        };
        (self.status(), body).into_response()
    }
}

/// Custom response handler for refused requests.
///
/// # Example
/// ```
/// use axum_privileges::{AccessDeniedHandler, AccessDenied};
/// use axum::response::{Response, IntoResponse};
///
/// struct RedirectToLogin;
///
/// impl AccessDeniedHandler for RedirectToLogin {
///     fn handle(&self, denied: &AccessDenied) -> Response {
///         (denied.status(), [("location", "/login")], "Sign in first").into_response()
///     }
/// }
/// ```
pub trait AccessDeniedHandler: Send + Sync {
    /// Handle a refused request and return a response.
    fn handle(&self, denied: &AccessDenied) -> Response;
}

/// Default handler: plain text 401 or 403.
#[derive(Debug, Clone, Default)]
pub struct DefaultDeniedHandler;

impl AccessDeniedHandler for DefaultDeniedHandler {
    fn handle(&self, denied: &AccessDenied) -> Response {
        denied.clone().into_response()
    }
}

/// Handler that returns a JSON error response.
#[derive(Debug, Clone, Default)]
pub struct JsonDeniedHandler {
    include_details: bool,
}

impl JsonDeniedHandler {
    /// Create a new JSON denied handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the method, path and required privileges in the response.
    ///
    /// This discloses the privilege vocabulary to clients.
    pub fn with_details(mut self) -> Self {
        self.include_details = true;
        self
    }
}

impl AccessDeniedHandler for JsonDeniedHandler {
    fn handle(&self, denied: &AccessDenied) -> Response {
        use axum::Json;

        let error = match denied.reason {
            DenialReason::Unauthenticated => "unauthenticated",
            DenialReason::Forbidden => "access_denied",
        };
        let message = denied
            .message
            .as_deref()
            .unwrap_or_else(|| denied.default_message());

        let body = if self.include_details {
            serde_json::json!({
                "error": error,
                "message": message,
                "method": denied.method.as_str(),
                "path": denied.path,
                "required_privileges": denied.required,
            })
        } else {
            serde_json::json!({
                "error": error,
                "message": message,
            })
        };

        (denied.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::privilege_set;

    fn denied(reason: DenialReason) -> AccessDenied {
        AccessDenied::new(reason, Method::POST, "/icon", privilege_set(["CREATE_ICON"]))
    }

    #[test]
    fn test_status_by_reason() {
        assert_eq!(denied(DenialReason::Unauthenticated).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(denied(DenialReason::Forbidden).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_default_handler_status() {
        let response = DefaultDeniedHandler.handle(&denied(DenialReason::Forbidden));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = DefaultDeniedHandler.handle(&denied(DenialReason::Unauthenticated));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_json_handler_content_type() {
        let response = JsonDeniedHandler::new()
            .with_details()
            .handle(&denied(DenialReason::Forbidden));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_display() {
        let d = denied(DenialReason::Forbidden);
        assert_eq!(
            d.to_string(),
            "Access denied for POST /icon (requires any of: CREATE_ICON)"
        );
        assert_eq!(d.with_message("nope").to_string(), "nope");
    }
}
