use crate::entities::{SessionStatus, attendance_entity as attendance, session_entity as sessions};
use crate::error::AppResult;
use crate::models::*;
use crate::services::{
    AttendanceService, MemberService, SessionService, TransactionService,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Read-only views stitched together from the other services.
#[derive(Clone)]
pub struct DashboardService {
    pool: DatabaseConnection,
    member_service: MemberService,
    attendance_service: AttendanceService,
    transaction_service: TransactionService,
    session_service: SessionService,
}

impl DashboardService {
    pub fn new(
        pool: DatabaseConnection,
        member_service: MemberService,
        attendance_service: AttendanceService,
        transaction_service: TransactionService,
        session_service: SessionService,
    ) -> Self {
        Self {
            pool,
            member_service,
            attendance_service,
            transaction_service,
            session_service,
        }
    }

    pub async fn summary(&self, actor: &AuthUser) -> AppResult<DashboardSummary> {
        actor.require_staff()?;
        let today = local_today();

        let members = self.member_service.status_summary().await?;
        let capacity = self.attendance_service.capacity().await?;
        let attendance_today = attendance::Entity::find()
            .filter(attendance::Column::Date.eq(today))
            .count(&self.pool)
            .await?;
        let sales = self.transaction_service.daily_summary(today).await?;
        let pending_sessions = sessions::Entity::find()
            .filter(sessions::Column::Status.eq(SessionStatus::Pending))
            .count(&self.pool)
            .await?;

        Ok(DashboardSummary {
            members,
            capacity,
            attendance_today,
            sales_today: sales.total_amount,
            transactions_today: sales.transaction_count,
            pending_sessions,
        })
    }

    /// Everything the member portal home screen shows for the signed-in member.
    pub async fn member_profile(&self, actor: &AuthUser) -> AppResult<MemberPortalProfile> {
        let member_id = actor.own_member_id()?;
        let model = MemberService::find_model(&self.pool, member_id).await?;
        let booking_usage = self.session_service.usage_of(&self.pool, &model).await?;
        let capacity = self.attendance_service.capacity().await?;

        Ok(MemberPortalProfile {
            member: self.member_service.to_response(model, local_today()),
            booking_usage,
            capacity,
        })
    }

    pub async fn member_attendance(
        &self,
        actor: &AuthUser,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> AppResult<PaginatedResponse<AttendanceResponse>> {
        let member_id = actor.own_member_id()?;
        self.attendance_service
            .history(&AttendanceQuery {
                from: None,
                to: None,
                member_id: Some(member_id),
                status: None,
                page,
                page_size,
            })
            .await
    }
}
