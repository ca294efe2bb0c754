use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::cancellation::CancelAvailability;
use crate::handlers::{BookRequest, CancelRequest};
use crate::models::{BookingReceipt, BookingRef, BookingStatus, BookingType, SessionView};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::get_schedule,
        crate::handlers::post_booking,
        crate::handlers::post_cancel
    ),
    components(schemas(
        SessionView,
        BookingRef,
        BookingReceipt,
        BookingStatus,
        BookingType,
        CancelAvailability,
        BookRequest,
        CancelRequest
    )),
    tags(
        (name = "schedule", description = "Merged schedule view models"),
        (name = "bookings", description = "Booking and cancellation commits")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
