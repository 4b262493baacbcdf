use std::sync::Arc;

use axum::{
    Json,
    extract::{self, Path},
};
use serde::Serialize;
use tracing::info;

use crate::{error::AppError, ledger::Counts, state::State};

#[derive(Debug, Serialize)]
pub struct Liked {
    pub project: String,
    pub likes: u64,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn likes_handler(extract::State(state): extract::State<Arc<State>>) -> Json<Counts> {
    Json(state.ledger.counts().await)
}

pub async fn like_handler(
    extract::State(state): extract::State<Arc<State>>,
    Path(project): Path<String>,
) -> Result<Json<Liked>, AppError> {
    let likes = state.ledger.like(&project).await?;

    info!("Liked {project:?}, now at {likes}");

    Ok(Json(Liked { project, likes }))
}

pub async fn health_handler() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: "likes",
        version: env!("CARGO_PKG_VERSION"),
    })
}
