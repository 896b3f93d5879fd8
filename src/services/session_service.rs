use crate::config::GymConfig;
use crate::entities::{
    MembershipType, Role, SessionStatus, member_entity as members, session_entity as sessions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{AuditService, MemberService, TrainerService};
use crate::utils::membership_status;
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct SessionService {
    pool: DatabaseConnection,
    gym: GymConfig,
    // covers the limit and overlap checks through to the insert
    booking_lock: Arc<Mutex<()>>,
}

impl SessionService {
    pub fn new(pool: DatabaseConnection, gym: GymConfig) -> Self {
        Self {
            pool,
            gym,
            booking_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn find_model<C: ConnectionTrait>(conn: &C, session_id: i32) -> AppResult<sessions::Model> {
        sessions::Entity::find_by_id(session_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
    }

    async fn usage_between<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: i32,
        plan: MembershipType,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> AppResult<BookingUsage> {
        let used = sessions::Entity::find()
            .filter(sessions::Column::MemberId.eq(member_id))
            .filter(sessions::Column::Status.is_in(SessionStatus::live()))
            .filter(sessions::Column::Date.gte(period_start))
            .filter(sessions::Column::Date.lte(period_end))
            .count(conn)
            .await?;
        let limit = plan.booking_limit(&self.gym.booking_limits);
        Ok(BookingUsage {
            used,
            limit,
            remaining: limit.saturating_sub(used),
            period_start,
            period_end,
        })
    }

    /// Live sessions on `date` whose time range intersects `[time_in, time_out)`.
    fn overlapping(date: NaiveDate, time_in: NaiveTime, time_out: NaiveTime) -> Condition {
        Condition::all()
            .add(sessions::Column::Date.eq(date))
            .add(sessions::Column::Status.is_in(SessionStatus::live()))
            .add(sessions::Column::TimeIn.lt(time_out))
            .add(sessions::Column::TimeOut.gt(time_in))
    }

    /// Allowance of the period the member is currently in.
    pub(crate) async fn usage_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        member: &members::Model,
    ) -> AppResult<BookingUsage> {
        match MemberService::current_period(conn, member.id, local_today()).await? {
            Some(p) => {
                self.usage_between(conn, member.id, p.membership_type, p.start_date, p.end_date)
                    .await
            }
            None => {
                self.usage_between(
                    conn,
                    member.id,
                    member.membership_type,
                    member.membership_start,
                    member.membership_end,
                )
                .await
            }
        }
    }

    pub async fn booking_usage(&self, member_id: i32) -> AppResult<BookingUsage> {
        let member = MemberService::find_model(&self.pool, member_id).await?;
        self.usage_of(&self.pool, &member).await
    }

    pub async fn book(
        &self,
        actor: &AuthUser,
        request: CreateSessionRequest,
    ) -> AppResult<SessionResponse> {
        let member_id = match actor.role {
            Role::Member => {
                let own = actor.own_member_id()?;
                if request.member_id.is_some_and(|id| id != own) {
                    return Err(AppError::Forbidden);
                }
                own
            }
            Role::Admin | Role::Cashier => request.member_id.ok_or_else(|| {
                AppError::ValidationError("member_id is required when booking for a member".into())
            })?,
            Role::Trainer => return Err(AppError::Forbidden),
        };

        let session_type = request.session_type.trim().to_string();
        if session_type.is_empty() || session_type.len() > 64 {
            return Err(AppError::ValidationError(
                "Session type must be between 1 and 64 characters".to_string(),
            ));
        }
        if request.time_out <= request.time_in {
            return Err(AppError::ValidationError(
                "Time out must be later than time in".to_string(),
            ));
        }
        let today = local_today();
        if request.date < today {
            return Err(AppError::ValidationError(
                "Sessions cannot be booked in the past".to_string(),
            ));
        }

        let _booking = self.booking_lock.lock().await;
        let txn = self.pool.begin().await?;

        let member = MemberService::find_model(&txn, member_id).await?;
        let status = membership_status(
            member.membership_start,
            member.membership_end,
            member.cancelled_at.is_some(),
            today,
            self.gym.expiring_within_days,
        );
        if !status.allows_booking() {
            return Err(AppError::ValidationError(format!(
                "Membership is {status}; renew before booking"
            )));
        }
        let outside_period = || {
            AppError::ValidationError(format!(
                "Session date must fall within the membership period {} to {}",
                member.membership_start, member.membership_end
            ))
        };
        if request.date < member.membership_start || request.date > member.membership_end {
            return Err(outside_period());
        }
        let period = MemberService::period_covering(&txn, member_id, request.date)
            .await?
            .ok_or_else(outside_period)?;
        if let Some(trainer_id) = request.trainer_id {
            TrainerService::find_active(&txn, trainer_id).await?;
        }

        // the allowance belongs to the period the session falls in
        let usage = self
            .usage_between(
                &txn,
                member_id,
                period.membership_type,
                period.start_date,
                period.end_date,
            )
            .await?;
        if usage.used >= usage.limit {
            return Err(AppError::BookingLimitReached {
                used: usage.used,
                limit: usage.limit,
            });
        }

        let clash = sessions::Entity::find()
            .filter(sessions::Column::MemberId.eq(member_id))
            .filter(Self::overlapping(request.date, request.time_in, request.time_out))
            .count(&txn)
            .await?;
        if clash > 0 {
            return Err(AppError::Conflict(
                "Member already has a session at that time".to_string(),
            ));
        }

        let now = Utc::now();
        let session = sessions::ActiveModel {
            member_id: Set(member_id),
            trainer_id: Set(request.trainer_id),
            session_type: Set(session_type),
            date: Set(request.date),
            time_in: Set(request.time_in),
            time_out: Set(request.time_out),
            status: Set(SessionStatus::Pending),
            remarks: Set(None),
            decided_by: Set(None),
            decided_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        AuditService::record(
            &txn,
            actor,
            "session.book",
            Some(format!(
                "#{} member #{} {} {}-{}",
                session.id, member_id, session.date, session.time_in, session.time_out
            )),
        )
        .await?;
        txn.commit().await?;
        Ok(session.into())
    }

    /// Lists sessions visible to `actor`: members see their own, trainers see
    /// theirs plus unassigned ones, staff see everything.
    pub async fn list(
        &self,
        actor: &AuthUser,
        query: &SessionQuery,
    ) -> AppResult<PaginatedResponse<SessionResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = sessions::Entity::find();
        match actor.role {
            Role::Member => {
                select = select.filter(sessions::Column::MemberId.eq(actor.own_member_id()?));
            }
            Role::Trainer => {
                let trainer_id = actor.trainer_id.ok_or(AppError::Forbidden)?;
                select = select.filter(
                    Condition::any()
                        .add(sessions::Column::TrainerId.eq(trainer_id))
                        .add(sessions::Column::TrainerId.is_null()),
                );
            }
            Role::Admin | Role::Cashier => {}
        }
        if let Some(status) = query.status {
            select = select.filter(sessions::Column::Status.eq(status));
        }
        if let Some(date) = query.date {
            select = select.filter(sessions::Column::Date.eq(date));
        }
        if let Some(member_id) = query.member_id {
            select = select.filter(sessions::Column::MemberId.eq(member_id));
        }
        if let Some(trainer_id) = query.trainer_id {
            select = select.filter(sessions::Column::TrainerId.eq(trainer_id));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(sessions::Column::Date)
            .order_by_asc(sessions::Column::TimeIn)
            .order_by_asc(sessions::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn decide(
        &self,
        actor: &AuthUser,
        session_id: i32,
        request: DecideSessionRequest,
    ) -> AppResult<SessionResponse> {
        actor.require_any(&[Role::Trainer, Role::Admin])?;
        if !matches!(
            request.status,
            SessionStatus::Approved | SessionStatus::Disapproved
        ) {
            return Err(AppError::ValidationError(
                "A decision must be approved or disapproved".to_string(),
            ));
        }
        let remarks = request
            .remarks
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if remarks.as_ref().is_some_and(|r| r.chars().count() > 255) {
            return Err(AppError::ValidationError(
                "Remarks must be at most 255 characters".to_string(),
            ));
        }

        let _booking = self.booking_lock.lock().await;
        let txn = self.pool.begin().await?;
        let session = Self::find_model(&txn, session_id).await?;

        let mut trainer_id = session.trainer_id;
        if actor.role == Role::Trainer {
            let own = actor.trainer_id.ok_or(AppError::Forbidden)?;
            match session.trainer_id {
                Some(assigned) if assigned != own => return Err(AppError::Forbidden),
                _ => trainer_id = Some(own),
            }
        }
        if !session.status.can_transition_to(request.status) {
            return Err(AppError::Conflict(format!(
                "Session is {} and cannot become {}",
                session.status, request.status
            )));
        }

        if request.status == SessionStatus::Approved
            && let Some(trainer_id) = trainer_id
        {
            let clash = sessions::Entity::find()
                .filter(sessions::Column::TrainerId.eq(trainer_id))
                .filter(sessions::Column::Id.ne(session.id))
                .filter(sessions::Column::Status.eq(SessionStatus::Approved))
                .filter(Self::overlapping(session.date, session.time_in, session.time_out))
                .count(&txn)
                .await?;
            if clash > 0 {
                return Err(AppError::Conflict(
                    "Trainer already has an approved session at that time".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let mut model = session.into_active_model();
        model.status = Set(request.status);
        model.trainer_id = Set(trainer_id);
        model.remarks = Set(remarks);
        model.decided_by = Set(Some(actor.account_id));
        model.decided_at = Set(Some(now));
        model.updated_at = Set(now);
        let updated = model.update(&txn).await?;

        AuditService::record(
            &txn,
            actor,
            "session.decide",
            Some(format!("#{session_id} {}", updated.status)),
        )
        .await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    pub async fn cancel(&self, actor: &AuthUser, session_id: i32) -> AppResult<SessionResponse> {
        let txn = self.pool.begin().await?;
        let session = Self::find_model(&txn, session_id).await?;

        match actor.role {
            Role::Member => {
                if session.member_id != actor.own_member_id()? {
                    return Err(AppError::Forbidden);
                }
            }
            Role::Admin | Role::Cashier => {}
            Role::Trainer => return Err(AppError::Forbidden),
        }
        if !session.status.can_transition_to(SessionStatus::Cancelled) {
            return Err(AppError::Conflict(format!(
                "A {} session cannot be cancelled",
                session.status
            )));
        }

        let mut model = session.into_active_model();
        model.status = Set(SessionStatus::Cancelled);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;

        AuditService::record(&txn, actor, "session.cancel", Some(format!("#{session_id}")))
            .await?;
        txn.commit().await?;
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{setup_test_db, test_gym_config};
    use crate::entities::PaymentMethod;
    use crate::services::member_service::tests::{enrol, staff};
    use crate::services::{AccountService, TransactionService};
    use chrono::Duration;

    struct Fixture {
        members: MemberService,
        trainers: TrainerService,
        sessions: SessionService,
    }

    async fn setup() -> Fixture {
        let db = setup_test_db().await;
        AccountService::insert_account(&db, "admin", "admin1234", Role::Admin, None, None)
            .await
            .unwrap();
        Fixture {
            members: MemberService::new(
                db.clone(),
                test_gym_config(),
                TransactionService::new(db.clone()),
            ),
            trainers: TrainerService::new(db.clone()),
            sessions: SessionService::new(db, test_gym_config()),
        }
    }

    fn member_user(member_id: i32) -> AuthUser {
        AuthUser {
            account_id: 10,
            username: "ana@example.com".into(),
            role: Role::Member,
            member_id: Some(member_id),
            trainer_id: None,
        }
    }

    fn trainer_user(trainer_id: i32) -> AuthUser {
        AuthUser {
            account_id: 20,
            username: "coach".into(),
            role: Role::Trainer,
            member_id: None,
            trainer_id: Some(trainer_id),
        }
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn slot(date: NaiveDate, from: u32, to: u32) -> CreateSessionRequest {
        CreateSessionRequest {
            member_id: None,
            trainer_id: None,
            session_type: "HIIT".into(),
            date,
            time_in: t(from),
            time_out: t(to),
        }
    }

    async fn new_trainer(f: &Fixture, name: &str) -> i32 {
        f.trainers
            .create_trainer(
                &staff(),
                CreateTrainerRequest {
                    name: name.into(),
                    contact: "09181234567".into(),
                    email: format!("{}@gym.test", name.to_lowercase()),
                    specialty: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_weekly_member_hits_booking_limit() {
        let f = setup().await;
        let id = f
            .members
            .create_member(&staff(), enrol("Ana Reyes", None, MembershipType::Weekly))
            .await
            .unwrap()
            .member
            .id;
        let me = member_user(id);
        let today = local_today();

        for h in [6, 8, 10] {
            f.sessions.book(&me, slot(today, h, h + 1)).await.unwrap();
        }
        let err = f.sessions.book(&me, slot(today, 12, 13)).await.unwrap_err();
        assert!(matches!(err, AppError::BookingLimitReached { used: 3, limit: 3 }));

        // a cancelled booking frees its slot
        let mine = f.sessions.list(&me, &SessionQuery::default()).await.unwrap();
        f.sessions.cancel(&me, mine.data[0].id).await.unwrap();
        f.sessions.book(&me, slot(today, 12, 13)).await.unwrap();

        let usage = f.sessions.booking_usage(id).await.unwrap();
        assert_eq!(usage.used, 3);
        assert_eq!(usage.remaining, 0);
    }

    #[tokio::test]
    async fn test_early_renewal_brings_a_fresh_allowance() {
        let f = setup().await;
        let id = f
            .members
            .create_member(&staff(), enrol("Ana Reyes", None, MembershipType::Weekly))
            .await
            .unwrap()
            .member
            .id;
        let me = member_user(id);
        let today = local_today();
        for h in [6, 8, 10] {
            f.sessions.book(&me, slot(today, h, h + 1)).await.unwrap();
        }

        f.members
            .renew_membership(
                &staff(),
                id,
                RenewMembershipRequest {
                    membership_type: None,
                    payment_method: PaymentMethod::Cash,
                },
            )
            .await
            .unwrap();

        // the first week is still used up
        let err = f
            .sessions
            .book(&me, slot(today + Duration::days(1), 8, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BookingLimitReached { used: 3, limit: 3 }));

        // the renewed week has its own three bookings
        for h in [6, 8, 10] {
            f.sessions
                .book(&me, slot(today + Duration::days(8), h, h + 1))
                .await
                .unwrap();
        }
        let err = f
            .sessions
            .book(&me, slot(today + Duration::days(9), 8, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BookingLimitReached { used: 3, limit: 3 }));

        let usage = f.sessions.booking_usage(id).await.unwrap();
        assert_eq!(usage.period_start, today);
        assert_eq!(usage.period_end, today + Duration::days(6));
        assert_eq!(usage.used, 3);
    }

    #[tokio::test]
    async fn test_upcoming_member_books_inside_paid_period() {
        let f = setup().await;
        let mut req = enrol("Ana Reyes", None, MembershipType::Weekly);
        let start = local_today() + Duration::days(2);
        req.membership_start = Some(start);
        let id = f.members.create_member(&staff(), req).await.unwrap().member.id;
        let me = member_user(id);

        let err = f.sessions.book(&me, slot(local_today(), 8, 9)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        f.sessions.book(&me, slot(start, 8, 9)).await.unwrap();

        let usage = f.sessions.booking_usage(id).await.unwrap();
        assert_eq!(usage.period_start, start);
        assert_eq!(usage.used, 1);
    }

    #[tokio::test]
    async fn test_booking_rules() {
        let f = setup().await;
        let id = f
            .members
            .create_member(&staff(), enrol("Ana Reyes", None, MembershipType::Weekly))
            .await
            .unwrap()
            .member
            .id;
        let me = member_user(id);
        let today = local_today();

        let err = f.sessions.book(&me, slot(today, 9, 8)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = f
            .sessions
            .book(&me, slot(today - Duration::days(1), 8, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = f
            .sessions
            .book(&me, slot(today + Duration::days(10), 8, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        f.sessions.book(&me, slot(today, 8, 10)).await.unwrap();
        let err = f.sessions.book(&me, slot(today, 9, 11)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut other = slot(today, 14, 15);
        other.member_id = Some(id + 1);
        assert!(matches!(
            f.sessions.book(&me, other).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_inactive_trainer_cannot_be_booked() {
        let f = setup().await;
        let id = f
            .members
            .create_member(&staff(), enrol("Ana Reyes", None, MembershipType::Monthly))
            .await
            .unwrap()
            .member
            .id;
        let trainer_id = new_trainer(&f, "Mia").await;
        f.trainers
            .update_trainer(
                &staff(),
                trainer_id,
                UpdateTrainerRequest {
                    name: None,
                    contact: None,
                    email: None,
                    specialty: None,
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();

        let mut req = slot(local_today(), 8, 9);
        req.member_id = Some(id);
        req.trainer_id = Some(trainer_id);
        let err = f.sessions.book(&staff(), req).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_trainer_decides_and_claims_sessions() {
        let f = setup().await;
        let id = f
            .members
            .create_member(&staff(), enrol("Ana Reyes", None, MembershipType::Monthly))
            .await
            .unwrap()
            .member
            .id;
        let mia = new_trainer(&f, "Mia").await;
        let leo = new_trainer(&f, "Leo").await;
        let today = local_today();

        let mut assigned = slot(today, 8, 9);
        assigned.member_id = Some(id);
        assigned.trainer_id = Some(leo);
        let assigned = f.sessions.book(&staff(), assigned).await.unwrap();

        let mut open = slot(today, 10, 11);
        open.member_id = Some(id);
        let open = f.sessions.book(&staff(), open).await.unwrap();

        // Mia sees only the unassigned booking
        let visible = f
            .sessions
            .list(&trainer_user(mia), &SessionQuery::default())
            .await
            .unwrap();
        assert_eq!(visible.total, 1);
        assert_eq!(visible.data[0].id, open.id);

        let err = f
            .sessions
            .decide(
                &trainer_user(mia),
                assigned.id,
                DecideSessionRequest {
                    status: SessionStatus::Approved,
                    remarks: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let approved = f
            .sessions
            .decide(
                &trainer_user(mia),
                open.id,
                DecideSessionRequest {
                    status: SessionStatus::Approved,
                    remarks: Some("See you there".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(approved.status, SessionStatus::Approved);
        assert_eq!(approved.trainer_id, Some(mia));
        assert_eq!(approved.decided_by, Some(20));

        let schedule = f.trainers.schedule(mia, today).await.unwrap();
        assert_eq!(schedule.len(), 1);

        // decisions are final
        let err = f
            .sessions
            .decide(
                &staff(),
                open.id,
                DecideSessionRequest {
                    status: SessionStatus::Disapproved,
                    remarks: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let f = setup().await;
        let ana = f
            .members
            .create_member(&staff(), enrol("Ana Reyes", None, MembershipType::Monthly))
            .await
            .unwrap()
            .member
            .id;
        let ben = f
            .members
            .create_member(&staff(), enrol("Ben Cruz", None, MembershipType::Monthly))
            .await
            .unwrap()
            .member
            .id;
        let booked = f
            .sessions
            .book(&member_user(ana), slot(local_today(), 8, 9))
            .await
            .unwrap();

        assert!(matches!(
            f.sessions.cancel(&member_user(ben), booked.id).await,
            Err(AppError::Forbidden)
        ));
        let cancelled = f.sessions.cancel(&member_user(ana), booked.id).await.unwrap();
        assert_eq!(cancelled.status, SessionStatus::Cancelled);
        assert!(matches!(
            f.sessions.cancel(&staff(), booked.id).await,
            Err(AppError::Conflict(_))
        ));
    }
}
