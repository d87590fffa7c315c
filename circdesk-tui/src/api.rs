//! HTTP client for the library management API.
//!
//! The service is an opaque remote: all entities live behind `/api/*` and the
//! client never holds authoritative state. [`LibraryBackend`] is the seam the
//! application state machine talks through; [`HttpBackend`] is the live
//! implementation, tests substitute a mock.

use anyhow::Context as _;
use async_trait::async_trait;
use circdesk_common::{Book, BookDraft, BorrowRequest, Loan, Member, MemberDraft, Stats};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Failure of a single API request. A non-2xx status is a failure in its own
/// right; the response body is not parsed for error detail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The operations the dashboard performs against the remote service.
///
/// Read operations carry the refresh-key cache-buster as `_=K`; it means
/// nothing to the server and only defeats response caching between two
/// otherwise identical GETs. The borrow dialog's member fetch passes `None`:
/// it re-fetches on every open instead of following the refresh key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryBackend: Send + Sync {
    async fn stats(&self, buster: u64) -> ApiResult<Stats>;
    async fn books(&self, buster: u64) -> ApiResult<Vec<Book>>;
    async fn members(&self, buster: Option<u64>) -> ApiResult<Vec<Member>>;
    async fn loans(&self, buster: u64) -> ApiResult<Vec<Loan>>;
    async fn create_book(&self, draft: BookDraft) -> ApiResult<Book>;
    async fn create_member(&self, draft: MemberDraft) -> ApiResult<Member>;
    async fn borrow(&self, request: BorrowRequest) -> ApiResult<Loan>;
    async fn return_loan(&self, id: i64) -> ApiResult<Loan>;
}

/// Live backend over `reqwest`. No retry, no backoff, no request timeout: a
/// hung request stays pending until the caller cancels it.
pub struct HttpBackend {
    base: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = base_url.trim_end_matches('/').to_string();
        Url::parse(&base).with_context(|| format!("invalid API base url: {base_url}"))?;
        Ok(Self {
            base,
            client: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str, buster: Option<u64>) -> String {
        match buster {
            Some(k) => format!("{}{}?_={}", self.base, path, k),
            None => format!("{}{}", self.base, path),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> ApiResult<T> {
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        response.json().await.map_err(ApiError::Decode)
    }

    async fn post_json<B, T>(&self, url: String, body: &B) -> ApiResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        response.json().await.map_err(ApiError::Decode)
    }

    /// POST without a body (and therefore without a content type), as the
    /// per-loan return endpoint expects.
    async fn post_empty<T: DeserializeOwned>(&self, url: String) -> ApiResult<T> {
        debug!(%url, "POST");
        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        response.json().await.map_err(ApiError::Decode)
    }
}

#[async_trait]
impl LibraryBackend for HttpBackend {
    async fn stats(&self, buster: u64) -> ApiResult<Stats> {
        self.get_json(self.url("/api/stats", Some(buster))).await
    }

    async fn books(&self, buster: u64) -> ApiResult<Vec<Book>> {
        self.get_json(self.url("/api/books", Some(buster))).await
    }

    async fn members(&self, buster: Option<u64>) -> ApiResult<Vec<Member>> {
        self.get_json(self.url("/api/members", buster)).await
    }

    async fn loans(&self, buster: u64) -> ApiResult<Vec<Loan>> {
        self.get_json(self.url("/api/loans", Some(buster))).await
    }

    async fn create_book(&self, draft: BookDraft) -> ApiResult<Book> {
        self.post_json(self.url("/api/books", None), &draft).await
    }

    async fn create_member(&self, draft: MemberDraft) -> ApiResult<Member> {
        self.post_json(self.url("/api/members", None), &draft).await
    }

    async fn borrow(&self, request: BorrowRequest) -> ApiResult<Loan> {
        self.post_json(self.url("/api/loans/borrow", None), &request)
            .await
    }

    async fn return_loan(&self, id: i64) -> ApiResult<Loan> {
        self.post_empty(self.url(&format!("/api/loans/{id}/return"), None))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_carry_the_cache_buster() {
        let backend = HttpBackend::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(
            backend.url("/api/books", Some(3)),
            "http://127.0.0.1:8080/api/books?_=3"
        );
        assert_eq!(
            backend.url("/api/members", None),
            "http://127.0.0.1:8080/api/members"
        );
        assert_eq!(
            backend.url("/api/loans/5/return", None),
            "http://127.0.0.1:8080/api/loans/5/return"
        );
    }

    #[test]
    fn trailing_slash_on_the_base_url_is_tolerated() {
        let backend = HttpBackend::new("http://localhost:9000/").unwrap();
        assert_eq!(
            backend.url("/api/stats", Some(0)),
            "http://localhost:9000/api/stats?_=0"
        );
    }

    #[test]
    fn garbage_base_url_is_rejected_up_front() {
        assert!(HttpBackend::new("not a url").is_err());
    }
}
