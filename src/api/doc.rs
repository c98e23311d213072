use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const ACCOUNTS_TAG: &str = "Accounts";
pub const ORG_TAG: &str = "Organisation";
pub const FARMERS_TAG: &str = "Farmers";
pub const ATTENDANCE_TAG: &str = "Attendance";
pub const DISCIPLINE_TAG: &str = "Discipline";
pub const PAYMENTS_TAG: &str = "Payments";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scheme",
        description = "Irrigation scheme administration API",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
        )
    ),
    tags(
        (name = ACCOUNTS_TAG, description = "Registration, login, tokens and user administration"),
        (name = ORG_TAG, description = "Locations, blocks and sections"),
        (name = FARMERS_TAG, description = "Farmer registry and dashboard"),
        (name = ATTENDANCE_TAG, description = "Attendance records and penalties"),
        (name = DISCIPLINE_TAG, description = "Discipline cases"),
        (name = PAYMENTS_TAG, description = "Payment ledger"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/accounts/login/"))
                        .build(),
                ),
            )
        }
    }
}
