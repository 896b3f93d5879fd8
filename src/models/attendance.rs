use crate::entities::{AttendanceStatus, attendance_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RfidRequest {
    #[schema(example = "A1B2C3D4")]
    pub rfid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    pub id: i32,
    pub member_id: i32,
    pub member_name: Option<String>,
    pub rfid: String,
    pub date: NaiveDate,
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
}

impl AttendanceResponse {
    pub fn with_member_name(m: attendance_entity::Model, member_name: Option<String>) -> Self {
        Self {
            id: m.id,
            member_id: m.member_id,
            member_name,
            rfid: m.rfid,
            date: m.date,
            time_in: m.time_in,
            time_out: m.time_out,
            status: m.status,
        }
    }
}

impl From<attendance_entity::Model> for AttendanceResponse {
    fn from(m: attendance_entity::Model) -> Self {
        Self::with_member_name(m, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CapacityResponse {
    pub current: u64,
    pub max: u64,
    pub available: u64,
    pub is_full: bool,
}

impl CapacityResponse {
    pub fn new(current: u64, max: u64) -> Self {
        Self {
            current,
            max,
            available: max.saturating_sub(current),
            is_full: current >= max,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TapAction {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TapResponse {
    pub action: TapAction,
    pub record: AttendanceResponse,
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub member_id: Option<i32>,
    pub status: Option<AttendanceStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_full_at_max() {
        let c = CapacityResponse::new(50, 50);
        assert!(c.is_full);
        assert_eq!(c.available, 0);

        let c = CapacityResponse::new(12, 50);
        assert!(!c.is_full);
        assert_eq!(c.available, 38);
    }

    #[test]
    fn test_capacity_over_max_does_not_underflow() {
        let c = CapacityResponse::new(55, 50);
        assert!(c.is_full);
        assert_eq!(c.available, 0);
    }
}
