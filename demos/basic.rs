//! Basic example protecting an icon repository with privilege rules.
//!
//! Run with: `cargo run --example basic`
//!
//! Test with:
//! ```sh
//! # Listing icons is unrestricted
//! curl http://localhost:3000/icon
//!
//! # Creating an icon without a session (401)
//! curl -X POST http://localhost:3000/icon
//!
//! # Creating an icon as a tagger (403)
//! curl -X POST -H "X-Privileges: ADD_TAG" http://localhost:3000/icon
//!
//! # Creating an icon (allowed)
//! curl -X POST -H "X-Privileges: CREATE_ICON" http://localhost:3000/icon
//!
//! # Uploading an icon file needs CREATE_ICON or ADD_ICON_FILE
//! curl -X POST -H "X-Privileges: ADD_ICON_FILE" \
//!     http://localhost:3000/icon/cat/format/svg/size/24px
//! ```

use axum::{extract::Path, routing::post, Router};
use axum_privileges::{icon, JsonDeniedHandler, PrivilegeLayer, PrivilegeTable};
use http::Method;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn list_icons() -> &'static str {
    "[]"
}

async fn create_icon() -> &'static str {
    "Icon created"
}

async fn add_icon_file(Path((id, format, size)): Path<(String, String, String)>) -> String {
    format!("Stored {format} file of size {size} for icon {id}")
}

async fn remove_icon(Path(id): Path<String>) -> String {
    format!("Removed icon {id}")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "axum_privileges=debug,basic=debug".into()),
        )
        .init();

    let table = PrivilegeTable::builder()
        .add_entries(icon::rules())
        // Deleting an icon is not part of the stock rules
        .add("^/icon/[^/]+$", Method::DELETE, [icon::REMOVE_ICON])
        .build()
        .expect("privilege rules must compile");

    tracing::info!("Privilege table configured: {} endpoint rules", table.len());

    let app = Router::new()
        .route("/icon", post(create_icon).get(list_icons))
        .route("/icon/{id}", axum::routing::delete(remove_icon))
        .route("/icon/{id}/format/{format}/size/{size}", post(add_icon_file))
        .layer(PrivilegeLayer::new(table).with_denied_handler(JsonDeniedHandler::new().with_details()));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
