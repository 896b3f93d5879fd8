use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter, Iterable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "disapproved")]
    Disapproved,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl SessionStatus {
    /// Only a pending booking can be decided on.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Pending, SessionStatus::Approved)
                | (SessionStatus::Pending, SessionStatus::Disapproved)
                | (SessionStatus::Pending, SessionStatus::Cancelled)
                | (SessionStatus::Approved, SessionStatus::Cancelled)
        )
    }

    /// Bookings that still take a slot of the member's allowance.
    pub fn counts_against_limit(&self) -> bool {
        matches!(self, SessionStatus::Pending | SessionStatus::Approved)
    }

    pub fn live() -> Vec<SessionStatus> {
        SessionStatus::iter()
            .filter(|s| s.counts_against_limit())
            .collect()
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Pending => write!(f, "pending"),
            SessionStatus::Approved => write!(f, "approved"),
            SessionStatus::Disapproved => write!(f, "disapproved"),
            SessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub member_id: i32,
    pub trainer_id: Option<i32>,
    pub session_type: String,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: NaiveTime,
    pub status: SessionStatus,
    pub remarks: Option<String>,
    pub decided_by: Option<i32>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id"
    )]
    Member,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_can_be_decided() {
        assert!(SessionStatus::Pending.can_transition_to(SessionStatus::Approved));
        assert!(SessionStatus::Pending.can_transition_to(SessionStatus::Disapproved));
        assert!(!SessionStatus::Approved.can_transition_to(SessionStatus::Disapproved));
        assert!(!SessionStatus::Disapproved.can_transition_to(SessionStatus::Approved));
        assert!(!SessionStatus::Cancelled.can_transition_to(SessionStatus::Pending));
    }

    #[test]
    fn test_approved_booking_can_still_be_cancelled() {
        assert!(SessionStatus::Approved.can_transition_to(SessionStatus::Cancelled));
        assert!(!SessionStatus::Disapproved.can_transition_to(SessionStatus::Cancelled));
    }

    #[test]
    fn test_live_statuses_hold_a_slot() {
        assert_eq!(
            SessionStatus::live(),
            vec![SessionStatus::Pending, SessionStatus::Approved]
        );
    }
}
