//! Kanban board manager.
//!
//! A REST backend over SQLite plus a typed client for it:
//!
//! ```text
//! ┌───────────┐  reqwest  ┌─────────────────────────────────────┐
//! │ BoardView │ ────────> │  server.rs  (axum Router, CORS)     │
//! │ (view.rs) │ <──────── │    └─ api.rs  (handlers, AppState)  │
//! └───────────┘   JSON    │         └─ db.rs  (DbHandle/SQLite) │
//!       │                 └─────────────────────────────────────┘
//!   client.rs (ApiClient, one wrapper per endpoint)
//! ```
//!
//! `models.rs` holds the wire types shared by both sides. Boards own
//! position-ordered lists, lists own position-ordered cards; positions
//! are sparse sort keys, assigned max+1 on insert and never compacted.

pub mod api;
pub mod client;
pub mod db;
pub mod models;
pub mod server;
pub mod view;
