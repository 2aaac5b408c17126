//! HTTP favorites store client
//!
//! Talks to the REST API exposed by `catchment serve`:
//! `GET|POST /api/favorites`, `PUT|DELETE /api/favorites/:id`.

use crate::catchment::{School, SchoolId};
use crate::constants::api::FAVORITES_PATH;
use crate::error::{Error, Result};
use crate::store::{FavoritesStore, StoreOp};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("catchment/", env!("CARGO_PKG_VERSION"));

/// Client for a remote favorites store
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

impl HttpStore {
    /// Create a client with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, FAVORITES_PATH)
    }

    fn item_url(&self, id: SchoolId) -> String {
        format!("{}{}/{}", self.base_url, FAVORITES_PATH, id)
    }

    /// Map a transport failure; timeouts and refused connections can be retried
    fn transport_error(op: StoreOp, err: reqwest::Error) -> Error {
        let message = format!("Favorites store {} failed: {}", op, err);
        if err.is_timeout() || err.is_connect() {
            Error::retryable(message)
        } else {
            Error::rejected(message)
        }
    }

    /// Turn a non-success response into an error
    async fn check(op: StoreOp, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = match response.json::<ErrorBody>().await {
            Ok(body) => format!("{} ({})", body.error, body.code),
            Err(_) => status.to_string(),
        };
        Err(Self::status_error(op, status, detail))
    }

    fn status_error(op: StoreOp, status: StatusCode, detail: String) -> Error {
        let message = format!("Favorites store {} returned {}: {}", op, status.as_u16(), detail);
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Error::retryable(message)
        } else {
            Error::rejected(message)
        }
    }
}

impl FavoritesStore for HttpStore {
    async fn list(&self) -> Result<Vec<School>> {
        debug!(url = %self.collection_url(), "listing favorites");
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|e| Self::transport_error(StoreOp::List, e))?;

        let response = Self::check(StoreOp::List, response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::rejected(format!("Failed to parse favorites: {}", e)))
    }

    async fn create(&self, school: &School) -> Result<()> {
        let response = self
            .client
            .post(self.collection_url())
            .json(school)
            .send()
            .await
            .map_err(|e| Self::transport_error(StoreOp::Create, e))?;

        Self::check(StoreOp::Create, response).await?;
        Ok(())
    }

    async fn update(&self, school: &School) -> Result<()> {
        let response = self
            .client
            .put(self.item_url(school.id))
            .json(school)
            .send()
            .await
            .map_err(|e| Self::transport_error(StoreOp::Update, e))?;

        Self::check(StoreOp::Update, response).await?;
        Ok(())
    }

    async fn delete(&self, id: SchoolId) -> Result<()> {
        let response = self
            .client
            .delete(self.item_url(id))
            .send()
            .await
            .map_err(|e| Self::transport_error(StoreOp::Delete, e))?;

        Self::check(StoreOp::Delete, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let store = HttpStore::new("http://localhost:7879/", Duration::from_secs(5)).unwrap();
        let id = SchoolId::nil();
        assert_eq!(store.collection_url(), "http://localhost:7879/api/favorites");
        assert_eq!(
            store.item_url(id),
            "http://localhost:7879/api/favorites/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_status_errors_classified() {
        let err = HttpStore::status_error(StoreOp::Update, StatusCode::BAD_GATEWAY, "x".into());
        assert!(err.is_retryable());

        let err = HttpStore::status_error(StoreOp::Update, StatusCode::NOT_FOUND, "x".into());
        assert!(matches!(err, Error::Persistence { retryable: false, .. }));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_retryable() {
        // Port 9 (discard) is closed on test machines
        let store = HttpStore::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = store.list().await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {}", err);
    }
}
