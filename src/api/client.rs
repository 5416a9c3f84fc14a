//! HTTP gateway for the event-registration platform API.
//!
//! One method per logical operation; every failure is normalized to
//! [`ApiError`] so call sites never inspect raw response shapes.

use std::time::Duration;

use reqwest::{header, multipart, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::group::{GroupConfirmation, GroupInscriptionDraft};
use crate::models::{
    Event, EventAnalysisRow, EventDraft, Inscription, InscriptionAnalyticsRow,
    InscriptionStatus, Page, Payment, PaymentStatus, Ticket, TicketSale,
};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the registration platform.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given bearer token, sharing the
    /// connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("Invalid bearer token".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
        url: &str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            debug!(url, error = %e, "failed to parse response body");
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .put(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::parse_json(response, &url).await
    }

    async fn patch_status(&self, path: &str, status: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .patch(&url)
            .headers(self.auth_headers()?)
            .query(&[("status", status)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn page_params(page: u32, page_size: u32) -> [(&'static str, String); 2] {
        [
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ]
    }

    // ===== Group Inscriptions =====

    /// Upload a group-inscription spreadsheet for server-side validation.
    /// Returns the priced draft; row failures surface as
    /// [`ApiError::Validation`].
    pub async fn upload_group_inscription(
        &self,
        responsible: &str,
        phone: &str,
        event_id: i64,
        file_name: &str,
        file: Vec<u8>,
    ) -> Result<GroupInscriptionDraft, ApiError> {
        let url = self.url("/inscriptions/group/upload");
        let part = multipart::Part::bytes(file).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .text("responsible", responsible.to_string())
            .text("phone", phone.to_string())
            .text("eventId", event_id.to_string())
            .part("file", part);

        debug!(event_id, file_name, "uploading group inscription spreadsheet");

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::parse_json(response, &url).await
    }

    /// Finalize a validated draft. The server owns the priced items; only
    /// the opaque cache key travels.
    pub async fn confirm_group_inscription(
        &self,
        cache_key: &str,
    ) -> Result<GroupConfirmation, ApiError> {
        self.post_json(
            "/inscriptions/group/confirm",
            &serde_json::json!({ "cacheKey": cache_key }),
        )
        .await
    }

    // ===== Inscriptions =====

    pub async fn fetch_inscription(&self, id: i64) -> Result<Inscription, ApiError> {
        self.get_json(&format!("/inscriptions/{}", id), &[]).await
    }

    pub async fn fetch_inscription_analytics(
        &self,
        id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Page<InscriptionAnalyticsRow>, ApiError> {
        self.get_json(
            &format!("/inscriptions/{}/analytics", id),
            &Self::page_params(page, page_size),
        )
        .await
    }

    pub async fn delete_inscription(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/inscriptions/{}/delete", id)).await
    }

    pub async fn update_inscription_status(
        &self,
        id: i64,
        status: InscriptionStatus,
    ) -> Result<(), ApiError> {
        self.patch_status(
            &format!("/inscriptions/{}/update", id),
            status.as_query_param(),
        )
        .await
    }

    // ===== Events =====

    pub async fn fetch_events(&self, page: u32, page_size: u32) -> Result<Page<Event>, ApiError> {
        self.get_json("/events", &Self::page_params(page, page_size))
            .await
    }

    pub async fn fetch_event(&self, id: i64) -> Result<Event, ApiError> {
        self.get_json(&format!("/events/{}", id), &[]).await
    }

    pub async fn create_event(&self, draft: &EventDraft) -> Result<Event, ApiError> {
        self.post_json("/events/create", draft).await
    }

    pub async fn update_event(&self, id: i64, draft: &EventDraft) -> Result<Event, ApiError> {
        self.put_json(&format!("/events/{}/update", id), draft).await
    }

    pub async fn delete_event(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/events/{}/delete", id)).await
    }

    pub async fn fetch_event_analysis(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Page<EventAnalysisRow>, ApiError> {
        self.get_json(
            &format!("/events/{}/analysis", event_id),
            &Self::page_params(page, page_size),
        )
        .await
    }

    pub async fn fetch_event_inscriptions(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Inscription>, ApiError> {
        self.get_json(
            &format!("/events/{}/inscriptions", event_id),
            &Self::page_params(page, page_size),
        )
        .await
    }

    // ===== Payments =====

    pub async fn fetch_event_payments(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Payment>, ApiError> {
        self.get_json(
            &format!("/events/{}/payments", event_id),
            &Self::page_params(page, page_size),
        )
        .await
    }

    pub async fn update_payment_status(
        &self,
        payment_id: i64,
        status: PaymentStatus,
    ) -> Result<(), ApiError> {
        self.patch_status(
            &format!("/payments/{}/update", payment_id),
            status.as_query_param(),
        )
        .await
    }

    // ===== Tickets =====

    pub async fn fetch_event_tickets(
        &self,
        event_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Ticket>, ApiError> {
        self.get_json(
            &format!("/events/{}/tickets", event_id),
            &Self::page_params(page, page_size),
        )
        .await
    }

    pub async fn sell_ticket(&self, sale: &TicketSale) -> Result<Ticket, ApiError> {
        self.post_json("/tickets/sell", sale).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_strips_trailing_slash() {
        let client = ApiClient::new("https://api.example.com/").expect("client");
        assert_eq!(
            client.url("/events/7/analysis"),
            "https://api.example.com/events/7/analysis"
        );
    }

    #[test]
    fn test_page_params() {
        let params = ApiClient::page_params(2, 20);
        assert_eq!(params[0], ("page", "2".to_string()));
        assert_eq!(params[1], ("pageSize", "20".to_string()));
    }
}
