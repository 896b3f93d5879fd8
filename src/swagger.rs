use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{AttendanceStatus, MembershipType, PaymentMethod, Role, SessionStatus};
use crate::handlers;
use crate::models::*;
use crate::utils::MembershipStatus;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::me,
        handlers::account::create_account,
        handlers::account::list_accounts,
        handlers::account::set_account_active,
        handlers::member::list_members,
        handlers::member::status_summary,
        handlers::member::get_member,
        handlers::member::create_member,
        handlers::member::update_member,
        handlers::member::renew_membership,
        handlers::member::cancel_membership,
        handlers::member::delete_member,
        handlers::attendance::capacity,
        handlers::attendance::check_in,
        handlers::attendance::check_out,
        handlers::attendance::tap,
        handlers::attendance::today,
        handlers::attendance::history,
        handlers::transaction::create_transaction,
        handlers::transaction::list_transactions,
        handlers::transaction::sales_summary,
        handlers::transaction::get_transaction,
        handlers::trainer::list_trainers,
        handlers::trainer::get_trainer,
        handlers::trainer::create_trainer,
        handlers::trainer::update_trainer,
        handlers::trainer::schedule,
        handlers::session::book_session,
        handlers::session::list_sessions,
        handlers::session::decide_session,
        handlers::session::cancel_session,
        handlers::audit::record_action,
        handlers::audit::list_entries,
        handlers::dashboard::summary,
        handlers::me::profile,
        handlers::me::attendance,
        handlers::me::sessions,
    ),
    components(
        schemas(
            ApiError,
            Role,
            MembershipType,
            MembershipStatus,
            AttendanceStatus,
            PaymentMethod,
            SessionStatus,
            LoginRequest,
            RefreshTokenRequest,
            AuthResponse,
            AccountResponse,
            CreateAccountRequest,
            SetAccountActiveRequest,
            MemberResponse,
            CreateMemberRequest,
            UpdateMemberRequest,
            RenewMembershipRequest,
            MembershipSaleResponse,
            MemberStatusSummary,
            RfidRequest,
            AttendanceResponse,
            CapacityResponse,
            TapAction,
            TapResponse,
            CreateTransactionRequest,
            TransactionResponse,
            ProductTotal,
            SalesSummary,
            TrainerResponse,
            CreateTrainerRequest,
            UpdateTrainerRequest,
            CreateSessionRequest,
            SessionResponse,
            DecideSessionRequest,
            BookingUsage,
            CreateAuditEntryRequest,
            AuditEntryResponse,
            DashboardSummary,
            MemberPortalProfile,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Sign-in and tokens"),
        (name = "accounts", description = "Staff, trainer and member portal accounts"),
        (name = "members", description = "Membership registry"),
        (name = "attendance", description = "RFID check-in/out and occupancy"),
        (name = "transactions", description = "Point of sale and receipts"),
        (name = "trainers", description = "Trainer roster and schedules"),
        (name = "sessions", description = "Training session bookings"),
        (name = "audit", description = "Append-only audit trail"),
        (name = "dashboard", description = "Front desk overview"),
        (name = "member portal", description = "Signed-in member's own data"),
    ),
    info(
        title = "Gym Backend API",
        version = "1.0.0",
        description = "REST API shared by the cashier, member and trainer portals",
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_scope() {
        let doc = ApiDoc::openapi();
        for path in [
            "/members",
            "/attendance/tap",
            "/transactions/{or_number}",
            "/sessions/{id}/status",
            "/audit-trail",
            "/me/profile",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
