//! Documentation of the portfolio like counter.
//!
//! The portfolio site itself is static: the browser fetches `projects.json`, `skills.json` and
//! `timeline.json` and renders everything client side. This crate is the only server piece, a tiny
//! API that keeps a like count per project card.
//!
//!
//!
//! # General Infrastructure
//! - Browser loads the static site from any static host (or from this server, see below)
//! - Project cards call `GET /likes` once to show counts
//! - Clicking a heart calls `POST /like/{project}` and shows the returned count
//! - The "already liked" flag lives in the browser's local storage only, nothing stops a second like
//! - Counts live in one JSON file next to the server
//!
//!
//!
//! # API
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/likes` | `{ "<project>": <likes>, ... }` |
//! | POST | `/like/{project}` | `{ "project": "<project>", "likes": <likes> }` |
//! | GET | `/health` | `{ "status": "ok", "service": "likes", "version": "<version>" }` |
//!
//! - `{project}` is URL decoded, so `/like/a%20b` likes `a b`
//! - Project names are not checked against the catalog, the display name is the key
//! - CORS is wide open since the site is usually served from another origin
//!
//!
//!
//! # Notes
//!
//! ## Lost Likes
//! Reading the file, bumping one key and writing it back on every request loses likes when two
//! requests interleave. Instead the ledger is loaded once and all increments go through one mutex,
//! which is held across the file write. Likes are rare enough that serializing them costs nothing.
//!
//! ## Static Hosting
//! Setting `LIKES_STATIC_DIR` makes every non API path fall through to that directory, handy to run
//! the whole portfolio locally with one process.
//!
//!
//!
//! # Setup
//!
//! Environment variables.
//! - `LIKES_PORT`: port to bind on `0.0.0.0`, default `3030`
//! - `LIKES_FILE`: ledger path, default `likes.json`
//! - `LIKES_STATIC_DIR`: optional site directory to serve
//! - `RUST_LOG`: log filter, e.g. `info` or `likes_server=debug`
//!
//! Run.
//! ```sh
//! RUST_LOG=info cargo run -p likes
//! ```
//!
//! Poke it.
//! ```sh
//! curl -X POST localhost:3030/like/Portfolio
//! curl localhost:3030/likes
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use anyhow::{Context, Result};
use signal::ctrl_c;
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod ledger;
pub mod routes;
pub mod state;

use config::Config;
use routes::{health_handler, like_handler, likes_handler};
use state::State;

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Like server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let router = Router::new()
        .route("/likes", get(likes_handler))
        .route("/like/{project}", post(like_handler))
        .route("/health", get(health_handler))
        .with_state(state.clone());

    let router = match &state.config.static_dir {
        Some(dir) => {
            info!("Serving static site from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router.layer(cors)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::app;
    use crate::{config::Config, state::State};

    async fn test_app(dir: &Path, static_dir: Option<&Path>) -> Router {
        let config = Config {
            port: 0,
            ledger_path: dir.join("likes.json"),
            static_dir: static_dir.map(Path::to_path_buf),
        };

        app(State::new(config).await)
    }

    async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, body.to_vec())
    }

    async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(app, method, uri).await;

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        let (status, body) = send_json(&app, "GET", "/likes").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_like_then_list() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        let (status, body) = send_json(&app, "POST", "/like/foo").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "project": "foo", "likes": 1 }));

        let (_, body) = send_json(&app, "GET", "/likes").await;
        assert_eq!(body, json!({ "foo": 1 }));
    }

    #[tokio::test]
    async fn test_sequential_likes() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        send_json(&app, "POST", "/like/foo").await;
        let (_, body) = send_json(&app, "POST", "/like/foo").await;

        assert_eq!(body, json!({ "project": "foo", "likes": 2 }));
    }

    #[tokio::test]
    async fn test_project_is_url_decoded() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        let (_, body) = send_json(&app, "POST", "/like/a%20b").await;
        assert_eq!(body, json!({ "project": "a b", "likes": 1 }));

        let (_, body) = send_json(&app, "GET", "/likes").await;
        assert_eq!(body, json!({ "a b": 1 }));
    }

    #[tokio::test]
    async fn test_likes_survive_restart() {
        let dir = TempDir::new().unwrap();

        let app = test_app(dir.path(), None).await;
        send_json(&app, "POST", "/like/foo").await;
        send_json(&app, "POST", "/like/bar").await;
        drop(app);

        let app = test_app(dir.path(), None).await;
        let (_, body) = send_json(&app, "GET", "/likes").await;

        assert_eq!(body, json!({ "foo": 1, "bar": 1 }));
    }

    #[tokio::test]
    async fn test_persist_failure() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir.path().join("missing"), None).await;

        let (status, _) = send(&app, "POST", "/like/foo").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (_, body) = send_json(&app, "GET", "/likes").await;
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        let (status, _) = send(&app, "GET", "/like/foo").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        let (status, body) = send_json(&app, "GET", "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "likes");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/like/foo")
            .header(header::ORIGIN, "https://portfolio.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_static_site() {
        let dir = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        std::fs::write(site.path().join("index.html"), "<h1>portfolio</h1>").unwrap();

        let app = test_app(dir.path(), Some(site.path())).await;

        let (status, body) = send(&app, "GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>portfolio</h1>");

        let (status, _) = send(&app, "GET", "/projects/projects.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send_json(&app, "GET", "/likes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_no_static_site() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path(), None).await;

        let (status, _) = send(&app, "GET", "/index.html").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
