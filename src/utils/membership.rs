//! Membership lifecycle rules.
//!
//! Status is never stored: it is derived from the membership dates, the
//! cancellation marker and "today". End dates are inclusive, so a membership
//! ending today still lets the member in. A plan bought ahead of its start
//! date is `upcoming` until that day.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{BookingLimits, PlanPrices};
use crate::entities::MembershipType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Upcoming,
    Active,
    Expiring,
    Expired,
    Cancelled,
}

impl MembershipStatus {
    pub fn allows_entry(&self) -> bool {
        matches!(self, MembershipStatus::Active | MembershipStatus::Expiring)
    }

    /// Sessions may be booked ahead for a plan that has not started yet.
    pub fn allows_booking(&self) -> bool {
        self.allows_entry() || *self == MembershipStatus::Upcoming
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipStatus::Upcoming => write!(f, "upcoming"),
            MembershipStatus::Active => write!(f, "active"),
            MembershipStatus::Expiring => write!(f, "expiring"),
            MembershipStatus::Expired => write!(f, "expired"),
            MembershipStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl MembershipType {
    pub fn duration_days(&self) -> i64 {
        match self {
            MembershipType::Weekly => 7,
            MembershipType::Monthly => 30,
            MembershipType::WalkIn => 1,
        }
    }

    pub fn booking_limit(&self, limits: &BookingLimits) -> u64 {
        match self {
            MembershipType::Weekly => limits.weekly,
            MembershipType::Monthly => limits.monthly,
            MembershipType::WalkIn => limits.walk_in,
        }
    }

    pub fn price(&self, prices: &PlanPrices) -> i64 {
        match self {
            MembershipType::Weekly => prices.weekly,
            MembershipType::Monthly => prices.monthly,
            MembershipType::WalkIn => prices.walk_in,
        }
    }

    /// Receipt line used when a plan is sold at the counter.
    pub fn product_name(&self) -> &'static str {
        match self {
            MembershipType::Weekly => "Weekly Membership",
            MembershipType::Monthly => "Monthly Membership",
            MembershipType::WalkIn => "Walk-in Pass",
        }
    }
}

/// Last valid day of a plan starting on `start`.
pub fn membership_end(start: NaiveDate, membership_type: MembershipType) -> NaiveDate {
    start + Duration::days(membership_type.duration_days() - 1)
}

/// Days from `today` until `end`; negative once the membership has lapsed.
pub fn days_left(end: NaiveDate, today: NaiveDate) -> i64 {
    (end - today).num_days()
}

pub fn membership_status(
    start: NaiveDate,
    end: NaiveDate,
    cancelled: bool,
    today: NaiveDate,
    expiring_within_days: i64,
) -> MembershipStatus {
    if cancelled {
        return MembershipStatus::Cancelled;
    }
    if today < start {
        return MembershipStatus::Upcoming;
    }
    let left = days_left(end, today);
    if left < 0 {
        MembershipStatus::Expired
    } else if left <= expiring_within_days {
        MembershipStatus::Expiring
    } else {
        MembershipStatus::Active
    }
}

/// Start date of a renewal bought on `today`.
///
/// A still-valid membership is extended back to back; a lapsed or cancelled one
/// restarts today.
pub fn renewal_start(current_end: NaiveDate, cancelled: bool, today: NaiveDate) -> NaiveDate {
    if !cancelled && current_end >= today {
        current_end + Duration::days(1)
    } else {
        today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_membership_end_is_inclusive() {
        assert_eq!(membership_end(d(2025, 3, 1), MembershipType::Weekly), d(2025, 3, 7));
        assert_eq!(membership_end(d(2025, 3, 1), MembershipType::Monthly), d(2025, 3, 30));
        assert_eq!(membership_end(d(2025, 3, 1), MembershipType::WalkIn), d(2025, 3, 1));
    }

    #[test]
    fn test_status_boundaries() {
        let today = d(2025, 3, 10);
        let start = d(2025, 3, 1);
        assert_eq!(membership_status(start, d(2025, 3, 9), false, today, 3), MembershipStatus::Expired);
        assert_eq!(membership_status(start, d(2025, 3, 10), false, today, 3), MembershipStatus::Expiring);
        assert_eq!(membership_status(start, d(2025, 3, 13), false, today, 3), MembershipStatus::Expiring);
        assert_eq!(membership_status(start, d(2025, 3, 14), false, today, 3), MembershipStatus::Active);
    }

    #[test]
    fn test_not_started_is_upcoming() {
        let today = d(2025, 3, 10);
        let end = d(2025, 4, 10);
        assert_eq!(membership_status(d(2025, 3, 11), end, false, today, 3), MembershipStatus::Upcoming);
        assert_eq!(membership_status(today, end, false, today, 3), MembershipStatus::Active);
        assert!(!MembershipStatus::Upcoming.allows_entry());
        assert!(MembershipStatus::Upcoming.allows_booking());
        assert!(!MembershipStatus::Expired.allows_booking());
    }

    #[test]
    fn test_cancelled_wins_over_dates() {
        let today = d(2025, 3, 10);
        assert_eq!(
            membership_status(d(2025, 3, 20), d(2025, 4, 10), true, today, 3),
            MembershipStatus::Cancelled
        );
        assert!(!MembershipStatus::Cancelled.allows_entry());
        assert!(MembershipStatus::Expiring.allows_entry());
        assert!(!MembershipStatus::Expired.allows_entry());
    }

    #[test]
    fn test_renewal_start() {
        let today = d(2025, 3, 10);
        // still valid: extend back to back
        assert_eq!(renewal_start(d(2025, 3, 12), false, today), d(2025, 3, 13));
        // ends today: next period starts tomorrow
        assert_eq!(renewal_start(today, false, today), d(2025, 3, 11));
        // lapsed or cancelled: restart today
        assert_eq!(renewal_start(d(2025, 3, 1), false, today), today);
        assert_eq!(renewal_start(d(2025, 3, 20), true, today), today);
    }

    #[test]
    fn test_booking_limits_follow_plan() {
        let limits = BookingLimits::default();
        assert_eq!(MembershipType::Weekly.booking_limit(&limits), 3);
        assert_eq!(MembershipType::Monthly.booking_limit(&limits), 12);
        assert_eq!(MembershipType::WalkIn.booking_limit(&limits), 1);
    }
}
