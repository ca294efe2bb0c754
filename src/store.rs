use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::models::{
    BookingRef, BookingRow, BookingType, CategoryRow, MemberProfile, MembershipRow, SessionRow,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("an active booking for this session already exists")]
    DuplicateBooking,
    #[error("booking is already checked in")]
    AlreadyCheckedIn,
    #[error("missing or malformed count in store response")]
    BadCount,
}

/// Read/write client for the Supabase-style REST interface of the managed
/// data store. All reads are plain row queries; the only writes are the
/// `book_session` procedure call and the booking status update. No retries:
/// failures bubble to the caller.
#[derive(Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    base_url: Arc<Url>,
    api_key: String,
    tenant_id: String,
}

/// Error payload shape the store returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct StoreErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// Extracts the total from a `content-range` header such as `0-0/42`.
pub(crate) fn parse_content_range_total(value: &str) -> Option<u32> {
    value.rsplit('/').next()?.trim().parse().ok()
}

/// Maps a failed commit response to the distinguished conflict cases the UI
/// has to message differently, falling back to a generic API error.
pub(crate) fn classify_commit_failure(status: u16, body: &str) -> StoreError {
    if let Ok(parsed) = serde_json::from_str::<StoreErrorBody>(body) {
        let message = parsed.message.unwrap_or_default();
        let lowered = message.to_ascii_lowercase();
        if parsed.code.as_deref() == Some("23505") || lowered.contains("already booked") {
            return StoreError::DuplicateBooking;
        }
        if lowered.contains("checked in") {
            return StoreError::AlreadyCheckedIn;
        }
        if !message.is_empty() {
            return StoreError::Api { status, message };
        }
    }
    StoreError::Api {
        status,
        message: body.chars().take(200).collect(),
    }
}

impl StoreClient {
    pub fn new(base_url: Url, api_key: String, tenant_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::new(base_url),
            api_key,
            tenant_id,
        }
    }

    fn endpoint(&self, path: &str) -> Url {
        self.base_url.join(path).expect("static store paths parse")
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn tenant_filter(&self) -> String {
        format!("eq.{}", self.tenant_id)
    }

    async fn failure(&self, response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if let Ok(parsed) = serde_json::from_str::<StoreErrorBody>(&body)
            && let Some(message) = parsed.message
        {
            return StoreError::Api { status, message };
        }
        StoreError::Api {
            status,
            message: body.chars().take(200).collect(),
        }
    }

    async fn get_rows<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, StoreError> {
        let response = self.authed(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(self.failure(response).await);
        }
        Ok(response.json().await?)
    }

    /// Session rows in `[from, to)`, soonest first, optionally narrowed to a
    /// category.
    pub async fn fetch_sessions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        category_id: Option<&str>,
    ) -> Result<Vec<SessionRow>, StoreError> {
        let mut url = self.endpoint("rest/v1/session_schedule");
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("tenant_id", &self.tenant_filter())
                .append_pair("starts_at", &format!("gte.{}", from.to_rfc3339()))
                .append_pair("starts_at", &format!("lt.{}", to.to_rfc3339()))
                .append_pair("order", "starts_at.asc");
            if let Some(category_id) = category_id {
                pairs.append_pair("category_id", &format!("eq.{category_id}"));
            }
        }
        self.get_rows(url).await
    }

    pub async fn fetch_session(&self, session_id: &str) -> Result<Option<SessionRow>, StoreError> {
        let mut url = self.endpoint("rest/v1/session_schedule");
        url.query_pairs_mut()
            .append_pair("tenant_id", &self.tenant_filter())
            .append_pair("id", &format!("eq.{session_id}"))
            .append_pair("limit", "1");
        Ok(self.get_rows(url).await?.into_iter().next())
    }

    /// The member's most recently started membership, if any. Status is not
    /// filtered here; the eligibility evaluator checks it.
    pub async fn fetch_active_membership(
        &self,
        member_id: &str,
    ) -> Result<Option<MembershipRow>, StoreError> {
        let mut url = self.endpoint("rest/v1/memberships");
        url.query_pairs_mut()
            .append_pair("tenant_id", &self.tenant_filter())
            .append_pair("user_id", &format!("eq.{member_id}"))
            .append_pair("order", "starts_at.desc")
            .append_pair("limit", "1");
        Ok(self.get_rows(url).await?.into_iter().next())
    }

    pub async fn fetch_member_profile(
        &self,
        member_id: &str,
    ) -> Result<Option<MemberProfile>, StoreError> {
        let mut url = self.endpoint("rest/v1/profiles");
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{member_id}"))
            .append_pair("limit", "1");
        Ok(self.get_rows(url).await?.into_iter().next())
    }

    /// All of the member's booking rows. Feeds both the per-session merge and
    /// the unpaid drop-in debt total in a single query.
    pub async fn fetch_member_bookings(
        &self,
        member_id: &str,
    ) -> Result<Vec<BookingRow>, StoreError> {
        let mut url = self.endpoint("rest/v1/bookings");
        url.query_pairs_mut()
            .append_pair("tenant_id", &self.tenant_filter())
            .append_pair("user_id", &format!("eq.{member_id}"))
            .append_pair("order", "created_at.desc");
        self.get_rows(url).await
    }

    pub async fn fetch_booking(
        &self,
        booking_id: &str,
        member_id: &str,
    ) -> Result<Option<BookingRow>, StoreError> {
        let mut url = self.endpoint("rest/v1/bookings");
        url.query_pairs_mut()
            .append_pair("tenant_id", &self.tenant_filter())
            .append_pair("id", &format!("eq.{booking_id}"))
            .append_pair("user_id", &format!("eq.{member_id}"))
            .append_pair("limit", "1");
        Ok(self.get_rows(url).await?.into_iter().next())
    }

    pub async fn fetch_categories(&self) -> Result<Vec<CategoryRow>, StoreError> {
        let mut url = self.endpoint("rest/v1/class_categories");
        url.query_pairs_mut()
            .append_pair("tenant_id", &self.tenant_filter());
        self.get_rows(url).await
    }

    /// Aggregate count of active bookings for a session, taken from the
    /// `content-range` total of a zero-row range request rather than by
    /// downloading the rows.
    pub async fn count_active_bookings(&self, session_id: &str) -> Result<u32, StoreError> {
        let mut url = self.endpoint("rest/v1/bookings");
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("tenant_id", &self.tenant_filter())
            .append_pair("session_id", &format!("eq.{session_id}"))
            .append_pair("status", "in.(booked,checked_in)");

        let response = self
            .authed(self.client.get(url))
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.failure(response).await);
        }

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or(StoreError::BadCount)
    }

    /// Invokes the server-side `book_session` procedure. The seat-reservation
    /// commit is atomic on the server; this client never pre-checks capacity.
    pub async fn book_session(
        &self,
        session_id: &str,
        member_id: &str,
        booking_type: BookingType,
    ) -> Result<BookingRef, StoreError> {
        let url = self.endpoint("rest/v1/rpc/book_session");
        let body = serde_json::json!({
            "p_tenant_id": self.tenant_id,
            "p_session_id": session_id,
            "p_user_id": member_id,
            "p_booking_type": booking_type,
        });

        let response = self.authed(self.client.post(url)).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_commit_failure(status.as_u16(), &text));
        }
        Ok(response.json().await?)
    }

    /// Marks a booking canceled and returns the updated row reference.
    pub async fn cancel_booking(&self, booking_id: &str) -> Result<BookingRef, StoreError> {
        let mut url = self.endpoint("rest/v1/bookings");
        url.query_pairs_mut()
            .append_pair("tenant_id", &self.tenant_filter())
            .append_pair("id", &format!("eq.{booking_id}"));

        let response = self
            .authed(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({"status": "canceled"}))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_commit_failure(status.as_u16(), &text));
        }

        let rows: Vec<BookingRef> = response.json().await?;
        rows.into_iter().next().ok_or(StoreError::Api {
            status: 404,
            message: format!("booking {booking_id} not found"),
        })
    }
}
