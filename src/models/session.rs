use crate::entities::{SessionStatus, session_entity};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Ignored for the member role; required when staff book on a member's behalf.
    pub member_id: Option<i32>,
    pub trainer_id: Option<i32>,
    #[schema(example = "HIIT")]
    pub session_type: String,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "08:00:00")]
    pub time_in: NaiveTime,
    #[schema(value_type = String, example = "09:00:00")]
    pub time_out: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: i32,
    pub member_id: i32,
    pub trainer_id: Option<i32>,
    pub session_type: String,
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub time_in: NaiveTime,
    #[schema(value_type = String)]
    pub time_out: NaiveTime,
    pub status: SessionStatus,
    pub remarks: Option<String>,
    pub decided_by: Option<i32>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<session_entity::Model> for SessionResponse {
    fn from(m: session_entity::Model) -> Self {
        Self {
            id: m.id,
            member_id: m.member_id,
            trainer_id: m.trainer_id,
            session_type: m.session_type,
            date: m.date,
            time_in: m.time_in,
            time_out: m.time_out,
            status: m.status,
            remarks: m.remarks,
            decided_by: m.decided_by,
            decided_at: m.decided_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecideSessionRequest {
    /// `approved` or `disapproved`.
    pub status: SessionStatus,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct SessionQuery {
    pub status: Option<SessionStatus>,
    pub date: Option<NaiveDate>,
    pub member_id: Option<i32>,
    pub trainer_id: Option<i32>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// Bookings used in the current membership period against the plan's limit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingUsage {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}
