use axum::{Json, extract::Path, extract::State, response::IntoResponse};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use chrono::{Duration, Utc};
use futures::future::join_all;
use tracing::warn;

use crate::{
    AppState,
    auth::verify_token,
    cancellation::{self, CancelAvailability},
    capacity::{SeatLedger, compute_remaining},
    eligibility::MemberContext,
    error::ApiError,
    models::{BookingReceipt, BookingStatus, BookingType, SessionRow, SessionView},
    schedule,
    store::StoreClient,
    validation::validate_days,
};

#[derive(Debug, serde::Deserialize)]
pub struct ScheduleQuery {
    pub member_id: String,
    #[serde(default = "default_days")]
    pub days: u8,
    pub category_id: Option<String>,
    pub token: Option<String>,
}

fn default_days() -> u8 {
    1
}

#[derive(Debug, serde::Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct BookRequest {
    pub member_id: String,
    pub session_id: String,
    pub kind: BookingType,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct CancelRequest {
    pub member_id: String,
}

#[utoipa::path(get, path = "/", tag = "schedule")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Classbook API",
        "endpoints": {
            "/schedule": "Merged per-session schedule view for a member",
            "/bookings": "Commit a booking (POST)",
            "/bookings/{id}/cancel": "Cancel a booking (POST)"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "schedule")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "schedule")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Remaining-seat counts for one fetch cycle. Sessions without a declared
/// capacity are recorded as unlimited without querying; a failed count query
/// falls back to the declared capacity (assume nobody booked) so one bad
/// aggregate never sinks the whole schedule.
pub(crate) async fn load_seat_counts(store: &StoreClient, sessions: &[SessionRow]) -> SeatLedger {
    let mut ledger = SeatLedger::new();

    let counted: Vec<&SessionRow> = sessions.iter().filter(|s| s.capacity.is_some()).collect();
    let counts = join_all(
        counted
            .iter()
            .map(|session| store.count_active_bookings(&session.id)),
    )
    .await;

    for session in sessions.iter().filter(|s| s.capacity.is_none()) {
        ledger.record(session.id.clone(), None);
    }
    for (session, count) in counted.into_iter().zip(counts) {
        match count {
            Ok(active) => ledger.record(session.id.clone(), compute_remaining(session.capacity, active)),
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "active-booking count failed, assuming empty session");
                ledger.record(session.id.clone(), session.capacity);
            }
        }
    }
    ledger
}

#[utoipa::path(
    get,
    path = "/schedule",
    params(
        ("member_id" = String, Query, description = "Member whose view to compute"),
        ("days" = u8, Query, description = "Days ahead to include (1-31)"),
        ("category_id" = Option<String>, Query, description = "Restrict to one class category"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Merged per-session view models", body = [SessionView]),
        (status = 401, description = "Invalid authentication token"),
        (status = 502, description = "Data store unavailable")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "schedule"
)]
pub async fn get_schedule(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    axum::extract::Query(query): axum::extract::Query<ScheduleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query.token.as_deref())?;

    let days = validate_days(query.days)?;

    let now = Utc::now();
    let to = now + Duration::days(i64::from(days));
    let store = &state.store;

    let sessions = store
        .fetch_sessions(now, to, query.category_id.as_deref())
        .await?;

    let (membership, profile, bookings, categories) = futures::try_join!(
        store.fetch_active_membership(&query.member_id),
        store.fetch_member_profile(&query.member_id),
        store.fetch_member_bookings(&query.member_id),
        store.fetch_categories(),
    )?;

    let ledger = load_seat_counts(store, &sessions).await;
    let member = MemberContext::new(membership, profile.as_ref(), &bookings);

    let views = schedule::build_views(&sessions, &ledger, &member, &bookings, &categories, now);
    Ok(Json(views))
}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = BookRequest,
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Booking committed", body = BookingReceipt),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Duplicate booking or already checked in"),
        (status = 502, description = "Data store unavailable")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "bookings"
)]
pub async fn post_booking(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    axum::extract::Query(query): axum::extract::Query<TokenQuery>,
    Json(body): Json<BookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query.token.as_deref())?;

    let store = &state.store;
    let session = store
        .fetch_session(&body.session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("session {} not found", body.session_id)))?;

    // Pre-commit count, so the receipt can carry an optimistic value without
    // a second round trip after the commit.
    let mut ledger = load_seat_counts(store, std::slice::from_ref(&session)).await;

    let booking = store
        .book_session(&body.session_id, &body.member_id, body.kind)
        .await?;

    if booking.status == BookingStatus::Booked {
        ledger.adjust(&session.id, -1);
    }

    Ok(Json(BookingReceipt {
        remaining_seats: ledger.remaining(&session.id),
        booking,
    }))
}

#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    request_body = CancelRequest,
    params(
        ("id" = String, Path, description = "Booking to cancel"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Booking canceled", body = BookingReceipt),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Cancellation window closed or booking not cancelable"),
        (status = 502, description = "Data store unavailable")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "bookings"
)]
pub async fn post_cancel(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(booking_id): Path<String>,
    axum::extract::Query(query): axum::extract::Query<TokenQuery>,
    Json(body): Json<CancelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, query.token.as_deref())?;

    let store = &state.store;
    let booking = store
        .fetch_booking(&booking_id, &body.member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("booking {booking_id} not found")))?;
    let session = store
        .fetch_session(&booking.session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("session {} not found", booking.session_id)))?;

    match cancellation::evaluate(
        Some(booking.status),
        session.starts_at,
        session.cancel_before_hours,
        Utc::now(),
    ) {
        CancelAvailability::Allowed => {}
        CancelAvailability::Locked => {
            return Err(ApiError::Conflict(format!(
                "cancellation closes {} hours before the session starts",
                session.cancel_before_hours.unwrap_or(0)
            )));
        }
        CancelAvailability::NotOffered => {
            return Err(ApiError::Conflict(
                "booking can no longer be canceled".into(),
            ));
        }
    }

    let mut ledger = load_seat_counts(store, std::slice::from_ref(&session)).await;

    let updated = store.cancel_booking(&booking.id).await?;

    if updated.status == BookingStatus::Canceled {
        ledger.adjust(&session.id, 1);
    }

    Ok(Json(BookingReceipt {
        remaining_seats: ledger.remaining(&session.id),
        booking: updated,
    }))
}
