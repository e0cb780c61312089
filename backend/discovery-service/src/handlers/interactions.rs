use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::InteractionRepository;
use crate::error::Result;
use crate::middleware::UserId;
use crate::models::InteractionKind;

pub struct InteractionHandlerState {
    pub repo: Arc<InteractionRepository>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub message: String,
    pub active: bool,
    pub likes_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub message: &'static str,
    pub read_count: i64,
}

fn toggle_message(kind: InteractionKind, active: bool) -> String {
    let noun = match kind {
        InteractionKind::Like => "Like",
        _ => "Favorite",
    };
    format!("{} {}", noun, if active { "added" } else { "removed" })
}

async fn toggle(
    state: &InteractionHandlerState,
    user: UserId,
    post_id: Uuid,
    kind: InteractionKind,
) -> Result<HttpResponse> {
    let outcome = state.repo.toggle(user.0, post_id, kind).await?;

    Ok(HttpResponse::Ok().json(ToggleResponse {
        message: toggle_message(kind, outcome.active),
        active: outcome.active,
        likes_count: outcome.like_count,
    }))
}

/// POST /api/v1/posts/{id}/like
pub async fn toggle_like(
    path: web::Path<Uuid>,
    user: UserId,
    state: web::Data<InteractionHandlerState>,
) -> Result<HttpResponse> {
    toggle(&state, user, path.into_inner(), InteractionKind::Like).await
}

/// POST /api/v1/posts/{id}/favorite
pub async fn toggle_favorite(
    path: web::Path<Uuid>,
    user: UserId,
    state: web::Data<InteractionHandlerState>,
) -> Result<HttpResponse> {
    toggle(&state, user, path.into_inner(), InteractionKind::Favorite).await
}

/// POST /api/v1/posts/{id}/read
pub async fn record_read(
    path: web::Path<Uuid>,
    user: UserId,
    state: web::Data<InteractionHandlerState>,
) -> Result<HttpResponse> {
    let read_count = state.repo.record_read(user.0, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ReadResponse {
        message: "Read recorded",
        read_count,
    }))
}

/// POST /api/v1/posts/{id}/comment
pub async fn record_comment(
    path: web::Path<Uuid>,
    user: UserId,
    state: web::Data<InteractionHandlerState>,
) -> Result<HttpResponse> {
    state.repo.record_comment(user.0, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "message": "Comment recorded" })))
}
