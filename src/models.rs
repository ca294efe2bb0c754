use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cancellation::CancelAvailability;

/// Lifecycle of a booking row as reported by the store. Transitions happen
/// server-side; this crate only reflects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Booked,
    CheckedIn,
    Canceled,
    NoShow,
}

impl BookingStatus {
    /// Booked and checked-in rows hold a seat.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Booked | BookingStatus::CheckedIn)
    }
}

/// How a booking row was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    Regular,
    DropIn,
}

/// Which entitlement a new booking commit should charge against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Membership,
    DropIn,
}

/// A scheduled class occurrence, flattened the way the store's schedule view
/// returns it. `capacity == None` means unlimited seats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SessionRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date-time", example = "2026-03-02T06:00:00Z")]
    pub starts_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<u32>,
    pub cancel_before_hours: Option<u32>,
    pub category_id: Option<String>,
    pub drop_in_enabled: Option<bool>,
    pub drop_in_price: Option<f64>,
    pub member_drop_in_price: Option<f64>,
}

impl SessionRow {
    pub fn drop_in_enabled(&self) -> bool {
        self.drop_in_enabled.unwrap_or(false)
    }
}

/// The member's currently relevant subscription. An empty category list
/// authorizes every category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MembershipRow {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub authorized_category_ids: Vec<String>,
}

impl MembershipRow {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// A member's reservation against a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BookingRow {
    pub id: String,
    pub session_id: String,
    pub status: BookingStatus,
    #[serde(default = "default_booking_kind")]
    pub kind: BookingKind,
    pub drop_in_price: Option<f64>,
    pub drop_in_paid: Option<bool>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

fn default_booking_kind() -> BookingKind {
    BookingKind::Regular
}

/// Class category lookup row, used only for display labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
}

/// Member profile fields the core reads. `max_dropin_debt` is the ceiling of
/// unpaid drop-in charges beyond which further drop-ins are blocked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct MemberProfile {
    pub id: String,
    pub max_dropin_debt: Option<f64>,
}

/// What booking commits return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BookingRef {
    pub id: String,
    pub status: BookingStatus,
}

/// Merged per-session projection consumed by the UI. Rebuilt from scratch on
/// every fetch cycle; the seat count is the only field adjusted between
/// refreshes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SessionView {
    pub session_id: String,
    pub title: String,
    pub description: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub starts_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub ends_at: Option<DateTime<Utc>>,
    pub category_label: String,
    pub capacity: Option<u32>,
    /// `None` means unlimited.
    pub remaining_seats: Option<u32>,
    pub is_full: bool,
    pub booking: Option<BookingRef>,
    pub can_book_with_membership: bool,
    pub drop_in_offered: bool,
    pub drop_in_price: Option<f64>,
    pub drop_in_locked: bool,
    pub cancellation: CancelAvailability,
}

/// Response to a successful book or cancel commit: the store's booking row
/// plus the optimistic post-commit seat count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BookingReceipt {
    pub booking: BookingRef,
    pub remaining_seats: Option<u32>,
}
