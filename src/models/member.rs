use crate::entities::{MembershipType, member_entity};
use crate::models::TransactionResponse;
use crate::utils::{MembershipStatus, days_left, membership_status};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub id: i32,
    pub rfid: Option<String>,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub membership_type: MembershipType,
    pub membership_start: NaiveDate,
    pub membership_end: NaiveDate,
    pub membership_status: MembershipStatus,
    pub days_left: i64,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MemberResponse {
    pub fn from_model(m: member_entity::Model, today: NaiveDate, expiring_within_days: i64) -> Self {
        let status = membership_status(
            m.membership_start,
            m.membership_end,
            m.cancelled_at.is_some(),
            today,
            expiring_within_days,
        );
        Self {
            id: m.id,
            rfid: m.rfid,
            name: m.name,
            contact: m.contact,
            email: m.email,
            membership_type: m.membership_type,
            membership_start: m.membership_start,
            membership_end: m.membership_end,
            membership_status: status,
            days_left: days_left(m.membership_end, today).max(0),
            cancelled_at: m.cancelled_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMemberRequest {
    #[schema(example = "Juan Dela Cruz")]
    pub name: String,
    #[schema(example = "09171234567")]
    pub contact: String,
    #[schema(example = "juan@example.com")]
    pub email: String,
    #[schema(example = "A1B2C3D4")]
    pub rfid: Option<String>,
    pub membership_type: MembershipType,
    /// Defaults to today.
    pub membership_start: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: crate::entities::PaymentMethod,
    /// When set, a member-portal account is created with the email as username.
    pub portal_password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub rfid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenewMembershipRequest {
    /// Keeps the current plan when omitted.
    pub membership_type: Option<MembershipType>,
    #[serde(default)]
    pub payment_method: crate::entities::PaymentMethod,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembershipSaleResponse {
    pub member: MemberResponse,
    pub transaction: TransactionResponse,
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct MemberQuery {
    pub status: Option<MembershipStatus>,
    pub membership_type: Option<MembershipType>,
    /// Matches name, email, contact or RFID.
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct MemberStatusSummary {
    pub total: u64,
    pub upcoming: u64,
    pub active: u64,
    pub expiring: u64,
    pub expired: u64,
    pub cancelled: u64,
}

impl MemberStatusSummary {
    pub fn add(&mut self, status: MembershipStatus) {
        self.total += 1;
        match status {
            MembershipStatus::Upcoming => self.upcoming += 1,
            MembershipStatus::Active => self.active += 1,
            MembershipStatus::Expiring => self.expiring += 1,
            MembershipStatus::Expired => self.expired += 1,
            MembershipStatus::Cancelled => self.cancelled += 1,
        }
    }
}
