//! Typed HTTP client for the kanban API: one thin wrapper per endpoint,
//! mirroring the server's wire shapes. The base URL is injected by the
//! caller (CLI flag or `KANRI_API_URL`), never a hardcoded constant.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{
    Board, BoardDetail, Card, CreateBoardRequest, CreateCardRequest, DeletedBoard, DeletedCard,
    UpdateBoardRequest, UpdateCardRequest,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    NotFound(String),

    #[error("server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Wire shape of every API failure body.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn non-2xx responses into typed errors, keeping the server's
    /// `{"error": msg}` message when it parses.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());
        if status == reqwest::StatusCode::NOT_FOUND {
            Err(ClientError::NotFound(message))
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    // ── Boards ────────────────────────────────────────────────────────

    pub async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        let resp = self.http.get(self.url("/boards")).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_board(&self, id: i64) -> Result<BoardDetail, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/boards/{}", id)))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn create_board(&self, name: &str) -> Result<BoardDetail, ClientError> {
        let resp = self
            .http
            .post(self.url("/boards"))
            .json(&CreateBoardRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn update_board(&self, id: i64, name: &str) -> Result<Board, ClientError> {
        let resp = self
            .http
            .put(self.url(&format!("/boards/{}", id)))
            .json(&UpdateBoardRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn delete_board(&self, id: i64) -> Result<DeletedBoard, ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/boards/{}", id)))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    // ── Cards ─────────────────────────────────────────────────────────

    pub async fn create_card(&self, req: &CreateCardRequest) -> Result<Card, ClientError> {
        let resp = self.http.post(self.url("/cards")).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn update_card(
        &self,
        id: i64,
        req: &UpdateCardRequest,
    ) -> Result<Card, ClientError> {
        let resp = self
            .http
            .put(self.url(&format!("/cards/{}", id)))
            .json(req)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn delete_card(&self, id: i64) -> Result<DeletedCard, ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/cards/{}", id)))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}
