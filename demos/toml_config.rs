//! Example loading privilege rules from TOML, with reloads.
//!
//! The embedded configuration is used unless `PRIVILEGES_FILE` points at a
//! TOML file, in which case `POST /rules/reload` re-reads that file and swaps
//! the table in place. A file that fails to load leaves the current rules.
//!
//! Run with: `cargo run --example toml_config`
//!
//! Test endpoints:
//! ```sh
//! # Tagging an icon needs ADD_TAG
//! curl -X POST -H "X-Privileges: ADD_TAG" http://localhost:3000/icon/cat/tag/animal
//!
//! # Removing a tag as a tagger (403)
//! curl -X DELETE -H "X-Privileges: ADD_TAG" http://localhost:3000/icon/cat/tag/animal
//!
//! # Rename an icon
//! curl -X PATCH -H "X-Privileges: UPDATE_ICON" http://localhost:3000/icon/cat
//!
//! # Reload the rules file
//! PRIVILEGES_FILE=privileges.toml cargo run --example toml_config
//! curl -X POST -H "X-Privileges: ADMIN" http://localhost:3000/rules/reload
//! ```

use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Router,
};
use axum_privileges::{PrivilegeLayer, PrivilegeTable, SharedPrivilegeTable, TomlFileRuleProvider};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EMBEDDED_CONFIG: &str = r#"
[endpoints."^/icon$"]
POST = ["CREATE_ICON"]

[endpoints."^/icon/[^/]+$"]
PATCH = ["UPDATE_ICON"]
DELETE = ["REMOVE_ICON"]

[endpoints."^/icon/[^/]+/format/[^/]+/size/[^/]+$"]
POST = ["CREATE_ICON", "ADD_ICON_FILE"]
DELETE = ["REMOVE_ICON_FILE"]

[[rules]]
endpoint = "^/icon/[^/]+/tag/[^/]+$"
methods = ["POST"]
privileges = ["ADD_TAG"]

[[rules]]
endpoint = "^/icon/[^/]+/tag/[^/]+$"
methods = ["DELETE"]
privileges = ["REMOVE_TAG"]

[[rules]]
endpoint = "^/rules/reload$"
methods = ["POST"]
privileges = ["ADMIN"]
"#;

#[derive(Clone)]
struct AppState {
    table: SharedPrivilegeTable,
    provider: Option<TomlFileRuleProvider>,
}

async fn ok() -> &'static str {
    "OK"
}

async fn reload(State(state): State<AppState>) -> (StatusCode, String) {
    let Some(provider) = &state.provider else {
        return (StatusCode::CONFLICT, "No rules file configured".to_string());
    };
    match state.table.reload(provider) {
        Ok(()) => (
            StatusCode::OK,
            format!("Loaded {} endpoint rules", state.table.snapshot().len()),
        ),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "axum_privileges=debug,toml_config=info".into()),
        )
        .init();

    let provider = std::env::var_os("PRIVILEGES_FILE").map(TomlFileRuleProvider::new);
    let table = match &provider {
        Some(provider) => PrivilegeTable::from_toml_file(provider.path())
            .expect("Failed to load privilege rules file"),
        None => PrivilegeTable::from_toml(EMBEDDED_CONFIG)
            .expect("Failed to parse embedded privilege rules"),
    };
    tracing::info!("Loaded {} endpoint rules", table.len());

    let layer = PrivilegeLayer::new(table);
    let state = AppState {
        table: layer.shared_table().clone(),
        provider,
    };

    let app = Router::new()
        .route("/icon", post(ok))
        .route("/icon/{id}", patch(ok).delete(ok))
        .route("/icon/{id}/format/{format}/size/{size}", post(ok).delete(ok))
        .route("/icon/{id}/tag/{tag}", post(ok).delete(ok))
        .route("/rules/reload", post(reload))
        .with_state(state)
        .layer(layer);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
