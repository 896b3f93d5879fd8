use crate::models::{BookingUsage, CapacityResponse, MemberResponse, MemberStatusSummary};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub members: MemberStatusSummary,
    pub capacity: CapacityResponse,
    pub attendance_today: u64,
    pub sales_today: i64,
    pub transactions_today: u64,
    pub pending_sessions: u64,
}

/// Landing data of the member portal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberPortalProfile {
    pub member: MemberResponse,
    pub booking_usage: BookingUsage,
    pub capacity: CapacityResponse,
}
