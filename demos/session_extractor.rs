//! Example reading caller privileges from a session set by an auth middleware.
//!
//! Run with: `cargo run --example session_extractor`
//!
//! Test with:
//! ```sh
//! # No session (401)
//! curl -X POST http://localhost:3000/icon
//!
//! # Uploader session: may add files but not create icons
//! curl -X POST -H "Authorization: Bearer uploader" http://localhost:3000/icon
//! curl -X POST -H "Authorization: Bearer uploader" \
//!     http://localhost:3000/icon/cat/format/png/size/32px
//!
//! # Owner session: may do everything
//! curl -X POST -H "Authorization: Bearer owner" http://localhost:3000/icon
//! ```

use axum::{
    extract::{Extension, Request},
    middleware::{self, Next},
    response::Response,
    routing::post,
    Router,
};
use axum_privileges::{
    icon, privilege_set, ExtensionPrivilegeExtractor, JsonDeniedHandler, PrivilegeLayer,
    PrivilegeSet,
};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The authenticated caller.
#[derive(Clone, Debug)]
struct Session {
    user: String,
    privileges: PrivilegeSet,
}

/// Simulated authentication: `Authorization: Bearer <user>` with a fixed user directory.
async fn authenticate(mut request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(user) = user {
        let privileges = match user.as_str() {
            "owner" => privilege_set(icon::ALL),
            "uploader" => privilege_set([icon::ADD_ICON_FILE]),
            "tagger" => privilege_set([icon::ADD_TAG, icon::REMOVE_TAG]),
            _ => PrivilegeSet::new(),
        };
        request.extensions_mut().insert(Session { user, privileges });
    }

    next.run(request).await
}

async fn create_icon(Extension(session): Extension<Session>) -> String {
    format!("Icon created by {}", session.user)
}

async fn add_icon_file(Extension(session): Extension<Session>) -> String {
    format!("Icon file stored by {}", session.user)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "axum_privileges=debug,session_extractor=debug".into()),
        )
        .init();

    let table = icon::table().expect("icon rules must compile");

    let privileges = PrivilegeLayer::new(table)
        .with_extractor(ExtensionPrivilegeExtractor::<Session>::new(|s| {
            s.privileges.clone()
        }))
        .with_denied_handler(JsonDeniedHandler::new());

    // Layers run outermost-last: authentication wraps the privilege check.
    let app = Router::new()
        .route("/icon", post(create_icon))
        .route("/icon/{id}/format/{format}/size/{size}", post(add_icon_file))
        .layer(privileges)
        .layer(middleware::from_fn(authenticate));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
