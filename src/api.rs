use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::db::DbHandle;
#[cfg(test)]
use crate::db::BoardDb;
use crate::models::{
    CreateBoardRequest, CreateCardRequest, DeletedBoard, DeletedCard, UpdateBoardRequest,
    UpdateCardRequest,
};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

/// Failures surface as `{"error": msg}` with a 404 or 500 status; there
/// are no structured error codes beyond the status itself.
pub enum ApiError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(health_check))
        .route("/boards", get(list_boards).post(create_board))
        .route(
            "/boards/:id",
            get(get_board).put(update_board).delete(delete_board),
        )
        .route("/cards", post(create_card))
        .route("/cards/:id", put(update_card).delete(delete_card))
}

// ── Board handlers ────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "Kanban API running"
}

async fn list_boards(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let boards = state
        .db
        .call(move |db| db.list_boards())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(boards))
}

async fn get_board(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .db
        .call(move |db| db.get_board_detail(id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match detail {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::NotFound(format!("Board {} not found", id))),
    }
}

async fn create_board(
    State(state): State<SharedState>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name;
    let detail = state
        .db
        .call(move |db| db.create_board(&name))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(board_id = detail.board.id, "board created");
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update_board(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBoardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name;
    let board = state
        .db
        .call(move |db| db.update_board(id, &name))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match board {
        Some(board) => Ok(Json(board)),
        None => Err(ApiError::NotFound(format!("Board {} not found", id))),
    }
}

async fn delete_board(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state
        .db
        .call(move |db| db.delete_board(id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match board {
        Some(board) => {
            tracing::info!(board_id = id, "board deleted");
            Ok(Json(DeletedBoard {
                message: "Board deleted".to_string(),
                board,
            }))
        }
        None => Err(ApiError::NotFound(format!("Board {} not found", id))),
    }
}

// ── Card handlers ─────────────────────────────────────────────────────

async fn create_card(
    State(state): State<SharedState>,
    Json(req): Json<CreateCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let description = req.description.unwrap_or_default();
    let card = state
        .db
        .call(move |db| {
            db.create_card(req.list_id, &req.title, &description, req.color.as_deref())
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(card)))
}

async fn update_card(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state
        .db
        .call(move |db| {
            db.update_card(
                id,
                &req.title,
                &req.description,
                req.color.as_deref(),
                req.list_id,
                req.position,
            )
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match card {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::NotFound(format!("Card {} not found", id))),
    }
}

async fn delete_card(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state
        .db
        .call(move |db| db.delete_card(id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match card {
        Some(card) => Ok(Json(DeletedCard {
            message: "Card deleted".to_string(),
            card,
        })),
        None => Err(ApiError::NotFound(format!("Card {} not found", id))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
