use crate::config::GymConfig;
use crate::entities::{AttendanceStatus, attendance_entity as attendance, member_entity as members};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{AuditService, MemberService};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AttendanceService {
    pool: DatabaseConnection,
    gym: GymConfig,
    // serialises the capacity check with the insert it guards
    entry_lock: Arc<Mutex<()>>,
}

impl AttendanceService {
    pub fn new(pool: DatabaseConnection, gym: GymConfig) -> Self {
        Self {
            pool,
            gym,
            entry_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn occupancy<C: ConnectionTrait>(conn: &C, today: NaiveDate) -> AppResult<u64> {
        Ok(attendance::Entity::find()
            .filter(attendance::Column::Date.eq(today))
            .filter(attendance::Column::Status.eq(AttendanceStatus::CheckedIn))
            .count(conn)
            .await?)
    }

    async fn open_record<C: ConnectionTrait>(
        conn: &C,
        member_id: i32,
        today: NaiveDate,
    ) -> AppResult<Option<attendance::Model>> {
        Ok(attendance::Entity::find()
            .filter(attendance::Column::MemberId.eq(member_id))
            .filter(attendance::Column::Date.eq(today))
            .filter(attendance::Column::Status.eq(AttendanceStatus::CheckedIn))
            .one(conn)
            .await?)
    }

    fn clean_rfid(rfid: &str) -> AppResult<String> {
        let rfid = rfid.trim().to_uppercase();
        if rfid.is_empty() {
            return Err(AppError::ValidationError("RFID is required".to_string()));
        }
        Ok(rfid)
    }

    pub async fn capacity(&self) -> AppResult<CapacityResponse> {
        let current = Self::occupancy(&self.pool, local_today()).await?;
        Ok(CapacityResponse::new(current, self.gym.max_capacity))
    }

    pub async fn check_in(&self, actor: &AuthUser, rfid: &str) -> AppResult<AttendanceResponse> {
        actor.require_staff()?;
        let rfid = Self::clean_rfid(rfid)?;
        let today = local_today();

        let _entry = self.entry_lock.lock().await;
        let txn = self.pool.begin().await?;

        let member = MemberService::find_by_rfid(&txn, &rfid).await?;
        let status = crate::utils::membership_status(
            member.membership_start,
            member.membership_end,
            member.cancelled_at.is_some(),
            today,
            self.gym.expiring_within_days,
        );
        if !status.allows_entry() {
            return Err(AppError::ValidationError(format!(
                "Membership of {} is {status}",
                member.name
            )));
        }
        if Self::open_record(&txn, member.id, today).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "{} is already checked in",
                member.name
            )));
        }
        let current = Self::occupancy(&txn, today).await?;
        if current >= self.gym.max_capacity {
            return Err(AppError::CapacityFull {
                current,
                max: self.gym.max_capacity,
            });
        }

        let now = Utc::now();
        let record = attendance::ActiveModel {
            member_id: Set(member.id),
            rfid: Set(rfid),
            date: Set(today),
            time_in: Set(now),
            time_out: Set(None),
            status: Set(AttendanceStatus::CheckedIn),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        AuditService::record(
            &txn,
            actor,
            "attendance.check_in",
            Some(format!("#{} {} ({}/{})", member.id, member.name, current + 1, self.gym.max_capacity)),
        )
        .await?;
        txn.commit().await?;

        log::info!("Member #{} checked in ({}/{})", member.id, current + 1, self.gym.max_capacity);
        Ok(AttendanceResponse::with_member_name(record, Some(member.name)))
    }

    pub async fn check_out(&self, actor: &AuthUser, rfid: &str) -> AppResult<AttendanceResponse> {
        actor.require_staff()?;
        let rfid = Self::clean_rfid(rfid)?;
        let today = local_today();

        let txn = self.pool.begin().await?;
        let member = MemberService::find_by_rfid(&txn, &rfid).await?;
        let open = Self::open_record(&txn, member.id, today)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} is not checked in", member.name)))?;

        let mut model = open.into_active_model();
        model.time_out = Set(Some(Utc::now()));
        model.status = Set(AttendanceStatus::CheckedOut);
        let record = model.update(&txn).await?;

        AuditService::record(
            &txn,
            actor,
            "attendance.check_out",
            Some(format!("#{} {}", member.id, member.name)),
        )
        .await?;
        txn.commit().await?;

        Ok(AttendanceResponse::with_member_name(record, Some(member.name)))
    }

    /// RFID reader entry point: checks the member out when inside, in otherwise.
    pub async fn tap(&self, actor: &AuthUser, rfid: &str) -> AppResult<TapResponse> {
        let clean = Self::clean_rfid(rfid)?;
        let member = MemberService::find_by_rfid(&self.pool, &clean).await?;
        let inside = Self::open_record(&self.pool, member.id, local_today())
            .await?
            .is_some();

        if inside {
            let record = self.check_out(actor, &clean).await?;
            Ok(TapResponse {
                action: TapAction::CheckOut,
                record,
            })
        } else {
            let record = self.check_in(actor, &clean).await?;
            Ok(TapResponse {
                action: TapAction::CheckIn,
                record,
            })
        }
    }

    pub async fn today(&self) -> AppResult<Vec<AttendanceResponse>> {
        let rows = attendance::Entity::find()
            .find_also_related(members::Entity)
            .filter(attendance::Column::Date.eq(local_today()))
            .order_by_desc(attendance::Column::TimeIn)
            .order_by_desc(attendance::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(a, m)| AttendanceResponse::with_member_name(a, m.map(|m| m.name)))
            .collect())
    }

    pub async fn history(
        &self,
        query: &AttendanceQuery,
    ) -> AppResult<PaginatedResponse<AttendanceResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = attendance::Entity::find();
        if let Some(from) = query.from {
            select = select.filter(attendance::Column::Date.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(attendance::Column::Date.lte(to));
        }
        if let Some(member_id) = query.member_id {
            select = select.filter(attendance::Column::MemberId.eq(member_id));
        }
        if let Some(status) = query.status {
            select = select.filter(attendance::Column::Status.eq(status));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .find_also_related(members::Entity)
            .order_by_desc(attendance::Column::Date)
            .order_by_desc(attendance::Column::TimeIn)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;
        let data = rows
            .into_iter()
            .map(|(a, m)| AttendanceResponse::with_member_name(a, m.map(|m| m.name)))
            .collect();

        Ok(PaginatedResponse::new(data, &params, total))
    }

    /// Closes records from earlier days that were never checked out.
    ///
    /// The time-out is set to the last second of the record's own day.
    pub async fn close_stale_records(&self) -> AppResult<u64> {
        let today = local_today();
        let txn = self.pool.begin().await?;
        let stale = attendance::Entity::find()
            .filter(attendance::Column::Date.lt(today))
            .filter(attendance::Column::Status.eq(AttendanceStatus::CheckedIn))
            .all(&txn)
            .await?;
        if stale.is_empty() {
            return Ok(0);
        }

        let closed = stale.len() as u64;
        for record in stale {
            let time_out = day_end_exclusive(record.date) - Duration::seconds(1);
            let mut model = record.into_active_model();
            model.time_out = Set(Some(time_out));
            model.status = Set(AttendanceStatus::AutoClosed);
            model.update(&txn).await?;
        }
        AuditService::record_system(
            &txn,
            "attendance.auto_close",
            Some(format!("{closed} open record(s) before {today}")),
        )
        .await?;
        txn.commit().await?;

        log::info!("Auto-closed {} stale attendance record(s)", closed);
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{setup_test_db, test_gym_config};
    use crate::entities::{MembershipType, Role};
    use crate::services::member_service::tests::{enrol, staff};
    use crate::services::{AccountService, TransactionService};
    use crate::utils::MembershipStatus;

    async fn setup() -> (DatabaseConnection, MemberService, AttendanceService) {
        let db = setup_test_db().await;
        AccountService::insert_account(&db, "admin", "admin1234", Role::Admin, None, None)
            .await
            .unwrap();
        let members = MemberService::new(
            db.clone(),
            test_gym_config(),
            TransactionService::new(db.clone()),
        );
        let attendance = AttendanceService::new(db.clone(), test_gym_config());
        (db, members, attendance)
    }

    async fn enrol_card(members: &MemberService, name: &str, rfid: &str) -> i32 {
        members
            .create_member(&staff(), enrol(name, Some(rfid), MembershipType::Monthly))
            .await
            .unwrap()
            .member
            .id
    }

    #[tokio::test]
    async fn test_check_in_blocked_at_capacity() {
        let (_db, members, svc) = setup().await;
        enrol_card(&members, "Ana Reyes", "CARD1").await;
        enrol_card(&members, "Ben Cruz", "CARD2").await;
        enrol_card(&members, "Carl Lim", "CARD3").await;

        svc.check_in(&staff(), "card1").await.unwrap();
        svc.check_in(&staff(), "CARD2").await.unwrap();
        let cap = svc.capacity().await.unwrap();
        assert!(cap.is_full);
        assert_eq!(cap.current, 2);

        let err = svc.check_in(&staff(), "CARD3").await.unwrap_err();
        assert!(matches!(err, AppError::CapacityFull { current: 2, max: 2 }));

        svc.check_out(&staff(), "CARD1").await.unwrap();
        svc.check_in(&staff(), "CARD3").await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_check_ins_never_exceed_capacity() {
        let (_db, members, svc) = setup().await;
        for (i, name) in ["Ana Reyes", "Ben Cruz", "Carl Lim", "Dina Go"].iter().enumerate() {
            enrol_card(&members, name, &format!("CARD{i}")).await;
        }

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.check_in(&staff(), &format!("CARD{i}")).await })
            })
            .collect();
        let mut admitted = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 2);
        assert_eq!(svc.capacity().await.unwrap().current, 2);
    }

    #[tokio::test]
    async fn test_double_check_in_and_unknown_card() {
        let (_db, members, svc) = setup().await;
        enrol_card(&members, "Ana Reyes", "CARD1").await;

        svc.check_in(&staff(), "CARD1").await.unwrap();
        assert!(matches!(
            svc.check_in(&staff(), "CARD1").await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            svc.check_in(&staff(), "NOPE").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.check_out(&staff(), "NOPE").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_or_cancelled_member_cannot_enter() {
        let (db, members, svc) = setup().await;
        let id = enrol_card(&members, "Ana Reyes", "CARD1").await;

        let mut model = members::Entity::find_by_id(id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .into_active_model();
        model.membership_end = Set(local_today() - Duration::days(1));
        model.update(&db).await.unwrap();

        let err = svc.check_in(&staff(), "CARD1").await.unwrap_err();
        match err {
            AppError::ValidationError(msg) => assert!(msg.contains("expired")),
            other => panic!("unexpected error: {other:?}"),
        }

        let id = enrol_card(&members, "Ben Cruz", "CARD2").await;
        members.cancel_membership(&staff(), id).await.unwrap();
        assert!(matches!(
            svc.check_in(&staff(), "CARD2").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_member_cannot_enter_before_plan_starts() {
        let (_db, members, svc) = setup().await;
        let mut req = enrol("Ana Reyes", Some("CARD1"), MembershipType::Weekly);
        req.membership_start = Some(local_today() + Duration::days(5));
        let created = members.create_member(&staff(), req).await.unwrap();
        assert_eq!(created.member.membership_status, MembershipStatus::Upcoming);

        let err = svc.check_in(&staff(), "CARD1").await.unwrap_err();
        match err {
            AppError::ValidationError(msg) => assert!(msg.contains("upcoming")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(svc.capacity().await.unwrap().current, 0);
    }

    #[tokio::test]
    async fn test_tap_toggles_and_today_lists_names() {
        let (_db, members, svc) = setup().await;
        enrol_card(&members, "Ana Reyes", "CARD1").await;

        let first = svc.tap(&staff(), "CARD1").await.unwrap();
        assert_eq!(first.action, TapAction::CheckIn);
        let second = svc.tap(&staff(), "CARD1").await.unwrap();
        assert_eq!(second.action, TapAction::CheckOut);
        assert_eq!(second.record.status, AttendanceStatus::CheckedOut);
        let third = svc.tap(&staff(), "CARD1").await.unwrap();
        assert_eq!(third.action, TapAction::CheckIn);

        let today = svc.today().await.unwrap();
        assert_eq!(today.len(), 2);
        assert_eq!(today[0].member_name.as_deref(), Some("Ana Reyes"));
    }

    #[tokio::test]
    async fn test_stale_records_are_auto_closed() {
        let (db, members, svc) = setup().await;
        let id = enrol_card(&members, "Ana Reyes", "CARD1").await;
        let yesterday = local_today() - Duration::days(1);
        let time_in = day_start(yesterday) + Duration::hours(18);
        attendance::ActiveModel {
            member_id: Set(id),
            rfid: Set("CARD1".into()),
            date: Set(yesterday),
            time_in: Set(time_in),
            time_out: Set(None),
            status: Set(AttendanceStatus::CheckedIn),
            created_at: Set(time_in),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        svc.check_in(&staff(), "CARD1").await.unwrap();

        assert_eq!(svc.close_stale_records().await.unwrap(), 1);
        assert_eq!(svc.close_stale_records().await.unwrap(), 0);

        let closed = svc
            .history(&AttendanceQuery {
                from: None,
                to: None,
                member_id: Some(id),
                status: Some(AttendanceStatus::AutoClosed),
                page: None,
                page_size: None,
            })
            .await
            .unwrap();
        assert_eq!(closed.total, 1);
        assert_eq!(
            closed.data[0].time_out,
            Some(day_end_exclusive(yesterday) - Duration::seconds(1))
        );
        // today's visit is untouched
        assert_eq!(svc.capacity().await.unwrap().current, 1);
    }
}
