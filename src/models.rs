use serde::{Deserialize, Serialize};

/// Top-level container owning an ordered set of lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub name: String,
}

/// Named column within a board. `cards` is only populated in the
/// board-detail response; it stays empty everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: i64,
    pub board_id: i64,
    pub name: String,
    pub position: i32,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,
    pub list_id: i64,
    pub title: String,
    pub description: String,
    /// Sparse sort key among siblings. Assigned max+1 on insert, never
    /// renumbered; duplicates are tolerated and display in fetch order.
    pub position: i32,
    pub color: Option<String>,
}

/// Response shape of `GET /boards/:id` and `POST /boards`: the board
/// plus its lists, each list carrying its cards ordered by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDetail {
    pub board: Board,
    pub lists: Vec<List>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedBoard {
    pub message: String,
    pub board: Board,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedCard {
    pub message: String,
    pub card: Card,
}

// ── Request payloads ──────────────────────────────────────────────────
//
// Shared between the axum handlers and the reqwest client, so they
// derive both directions. Bodies are snake_case on the wire.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBoardRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBoardRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub list_id: i64,
    pub title: String,
    /// Defaults to the empty string when omitted.
    #[serde(default)]
    pub description: Option<String>,
    /// Not validated server-side; the display layer supplies a fallback.
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update with mixed semantics, matching the wire contract:
/// `title`, `description` and `color` are always overwritten with the
/// supplied values, while `list_id` and `position` keep their prior
/// values when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCardRequest {
    pub title: String,
    pub description: String,
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}
