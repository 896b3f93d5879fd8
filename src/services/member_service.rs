use crate::config::GymConfig;
use crate::entities::{
    MembershipType, Role, attendance_entity as attendance, member_entity as members,
    period_entity as periods, transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{AccountService, AuditService, NewSale, TransactionService};
use crate::utils::*;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct MemberService {
    pool: DatabaseConnection,
    gym: GymConfig,
    transaction_service: TransactionService,
}

impl MemberService {
    pub fn new(
        pool: DatabaseConnection,
        gym: GymConfig,
        transaction_service: TransactionService,
    ) -> Self {
        Self {
            pool,
            gym,
            transaction_service,
        }
    }

    pub fn to_response(&self, model: members::Model, today: NaiveDate) -> MemberResponse {
        MemberResponse::from_model(model, today, self.gym.expiring_within_days)
    }

    pub fn status_of(&self, model: &members::Model, today: NaiveDate) -> MembershipStatus {
        membership_status(
            model.membership_start,
            model.membership_end,
            model.cancelled_at.is_some(),
            today,
            self.gym.expiring_within_days,
        )
    }

    pub(crate) async fn find_model<C: ConnectionTrait>(
        conn: &C,
        member_id: i32,
    ) -> AppResult<members::Model> {
        members::Entity::find_by_id(member_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {member_id} not found")))
    }

    pub(crate) async fn find_by_rfid<C: ConnectionTrait>(
        conn: &C,
        rfid: &str,
    ) -> AppResult<members::Model> {
        members::Entity::find()
            .filter(members::Column::Rfid.eq(rfid))
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No member registered to RFID {rfid}")))
    }

    async fn insert_period<C: ConnectionTrait>(
        conn: &C,
        member_id: i32,
        plan: MembershipType,
        start: NaiveDate,
        end: NaiveDate,
        transaction_id: i32,
    ) -> AppResult<periods::Model> {
        Ok(periods::ActiveModel {
            member_id: Set(member_id),
            membership_type: Set(plan),
            start_date: Set(start),
            end_date: Set(end),
            transaction_id: Set(Some(transaction_id)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?)
    }

    /// Paid period containing `date`. The newest purchase wins where periods overlap.
    pub(crate) async fn period_covering<C: ConnectionTrait>(
        conn: &C,
        member_id: i32,
        date: NaiveDate,
    ) -> AppResult<Option<periods::Model>> {
        Ok(periods::Entity::find()
            .filter(periods::Column::MemberId.eq(member_id))
            .filter(periods::Column::StartDate.lte(date))
            .filter(periods::Column::EndDate.gte(date))
            .order_by_desc(periods::Column::Id)
            .one(conn)
            .await?)
    }

    /// Period a member is in today, else the next one they paid for, else their last one.
    pub(crate) async fn current_period<C: ConnectionTrait>(
        conn: &C,
        member_id: i32,
        today: NaiveDate,
    ) -> AppResult<Option<periods::Model>> {
        if let Some(period) = Self::period_covering(conn, member_id, today).await? {
            return Ok(Some(period));
        }
        let next = periods::Entity::find()
            .filter(periods::Column::MemberId.eq(member_id))
            .filter(periods::Column::StartDate.gt(today))
            .order_by_asc(periods::Column::StartDate)
            .one(conn)
            .await?;
        if next.is_some() {
            return Ok(next);
        }
        Ok(periods::Entity::find()
            .filter(periods::Column::MemberId.eq(member_id))
            .order_by_desc(periods::Column::EndDate)
            .order_by_desc(periods::Column::Id)
            .one(conn)
            .await?)
    }

    async fn ensure_unique<C: ConnectionTrait>(
        conn: &C,
        email: Option<&str>,
        rfid: Option<&str>,
        except_id: Option<i32>,
    ) -> AppResult<()> {
        if let Some(email) = email {
            let mut q = members::Entity::find().filter(members::Column::Email.eq(email));
            if let Some(id) = except_id {
                q = q.filter(members::Column::Id.ne(id));
            }
            if q.count(conn).await? > 0 {
                return Err(AppError::Conflict(format!("Email {email} is already registered")));
            }
        }
        if let Some(rfid) = rfid {
            let mut q = members::Entity::find().filter(members::Column::Rfid.eq(rfid));
            if let Some(id) = except_id {
                q = q.filter(members::Column::Id.ne(id));
            }
            if q.count(conn).await? > 0 {
                return Err(AppError::Conflict(format!("RFID {rfid} is already assigned")));
            }
        }
        Ok(())
    }

    fn clean_rfid(rfid: Option<String>) -> AppResult<Option<String>> {
        match rfid.map(|r| r.trim().to_uppercase()) {
            Some(r) if r.is_empty() => Ok(None),
            Some(r) if r.len() > 64 || !r.chars().all(|c| c.is_ascii_alphanumeric()) => Err(
                AppError::ValidationError("RFID must be alphanumeric, at most 64 characters".into()),
            ),
            other => Ok(other),
        }
    }

    pub async fn list_members(
        &self,
        query: &MemberQuery,
    ) -> AppResult<PaginatedResponse<MemberResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let today = local_today();

        let mut select = members::Entity::find();
        if let Some(t) = query.membership_type {
            select = select.filter(members::Column::MembershipType.eq(t));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(members::Column::Name.contains(search))
                    .add(members::Column::Email.contains(search))
                    .add(members::Column::Contact.contains(search))
                    .add(members::Column::Rfid.contains(search)),
            );
        }

        // status is derived, so it is filtered after loading
        let rows = select
            .order_by_asc(members::Column::Name)
            .order_by_asc(members::Column::Id)
            .all(&self.pool)
            .await?;
        let items: Vec<MemberResponse> = rows
            .into_iter()
            .map(|m| self.to_response(m, today))
            .filter(|m| query.status.is_none_or(|s| m.membership_status == s))
            .collect();

        Ok(PaginatedResponse::from_vec(items, &params))
    }

    pub async fn get_member(&self, member_id: i32) -> AppResult<MemberResponse> {
        let model = Self::find_model(&self.pool, member_id).await?;
        Ok(self.to_response(model, local_today()))
    }

    pub async fn create_member(
        &self,
        actor: &AuthUser,
        request: CreateMemberRequest,
    ) -> AppResult<MembershipSaleResponse> {
        actor.require_staff()?;

        validate_name(&request.name)?;
        let contact = normalize_contact(&request.contact);
        validate_contact(&contact)?;
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        let rfid = Self::clean_rfid(request.rfid)?;
        if let Some(password) = request.portal_password.as_deref() {
            validate_password(password)?;
        }

        let today = local_today();
        let start = request.membership_start.unwrap_or(today);
        if start < today {
            return Err(AppError::ValidationError(
                "Membership cannot start in the past".to_string(),
            ));
        }
        let end = membership_end(start, request.membership_type);

        let _receipts = self.transaction_service.lock_receipts().await;
        let txn = self.pool.begin().await?;
        Self::ensure_unique(&txn, Some(&email), rfid.as_deref(), None).await?;

        let now = Utc::now();
        let member = members::ActiveModel {
            rfid: Set(rfid),
            name: Set(request.name.trim().to_string()),
            contact: Set(contact),
            email: Set(email.clone()),
            membership_type: Set(request.membership_type),
            membership_start: Set(start),
            membership_end: Set(end),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let sale = TransactionService::insert_sale(
            &txn,
            NewSale {
                member_id: Some(member.id),
                product: request.membership_type.product_name().to_string(),
                quantity: 1,
                amount: request.membership_type.price(&self.gym.prices),
                payment_method: request.payment_method,
                cashier_id: Some(actor.account_id),
            },
        )
        .await?;
        Self::insert_period(&txn, member.id, member.membership_type, start, end, sale.id).await?;

        if let Some(password) = request.portal_password.as_deref() {
            AccountService::insert_account(
                &txn,
                &email,
                password,
                Role::Member,
                Some(member.id),
                None,
            )
            .await?;
        }

        AuditService::record(
            &txn,
            actor,
            "member.create",
            Some(format!(
                "#{} {} ({}, {} to {}) {}",
                member.id, member.name, member.membership_type, start, end, sale.or_number
            )),
        )
        .await?;
        txn.commit().await?;

        log::info!("Enrolled member #{} on a {} plan", member.id, member.membership_type);
        Ok(MembershipSaleResponse {
            member: self.to_response(member, today),
            transaction: sale.into(),
        })
    }

    pub async fn update_member(
        &self,
        actor: &AuthUser,
        member_id: i32,
        request: UpdateMemberRequest,
    ) -> AppResult<MemberResponse> {
        actor.require_staff()?;

        if request.name.is_none()
            && request.contact.is_none()
            && request.email.is_none()
            && request.rfid.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let contact = request.contact.as_deref().map(normalize_contact);
        if let Some(c) = &contact {
            validate_contact(c)?;
        }
        let email = request.email.as_deref().map(normalize_email);
        if let Some(e) = &email {
            validate_email(e)?;
        }
        if let Some(n) = &request.name {
            validate_name(n)?;
        }
        // an explicitly empty RFID unassigns the card
        let rfid_change = match request.rfid {
            Some(r) => Some(Self::clean_rfid(Some(r))?),
            None => None,
        };

        let txn = self.pool.begin().await?;
        let existing = Self::find_model(&txn, member_id).await?;
        Self::ensure_unique(
            &txn,
            email.as_deref(),
            rfid_change.as_ref().and_then(|r| r.as_deref()),
            Some(member_id),
        )
        .await?;

        let mut model = existing.into_active_model();
        if let Some(n) = request.name {
            model.name = Set(n.trim().to_string());
        }
        if let Some(c) = contact {
            model.contact = Set(c);
        }
        if let Some(e) = email {
            model.email = Set(e);
        }
        if let Some(r) = rfid_change {
            model.rfid = Set(r);
        }
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;

        AuditService::record(&txn, actor, "member.update", Some(format!("#{member_id}"))).await?;
        txn.commit().await?;

        Ok(self.to_response(updated, local_today()))
    }

    pub async fn renew_membership(
        &self,
        actor: &AuthUser,
        member_id: i32,
        request: RenewMembershipRequest,
    ) -> AppResult<MembershipSaleResponse> {
        actor.require_staff()?;
        let today = local_today();

        let _receipts = self.transaction_service.lock_receipts().await;
        let txn = self.pool.begin().await?;
        let existing = Self::find_model(&txn, member_id).await?;

        let plan: MembershipType = request.membership_type.unwrap_or(existing.membership_type);
        let cancelled = existing.cancelled_at.is_some();
        let start = renewal_start(existing.membership_end, cancelled, today);
        let end = membership_end(start, plan);
        // coverage stays continuous across back-to-back periods
        let coverage_start = if start > today {
            existing.membership_start
        } else {
            start
        };

        let mut model = existing.into_active_model();
        model.membership_type = Set(plan);
        model.membership_start = Set(coverage_start);
        model.membership_end = Set(end);
        model.cancelled_at = Set(None);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;

        let sale = TransactionService::insert_sale(
            &txn,
            NewSale {
                member_id: Some(member_id),
                product: plan.product_name().to_string(),
                quantity: 1,
                amount: plan.price(&self.gym.prices),
                payment_method: request.payment_method,
                cashier_id: Some(actor.account_id),
            },
        )
        .await?;
        Self::insert_period(&txn, member_id, plan, start, end, sale.id).await?;

        AuditService::record(
            &txn,
            actor,
            "member.renew",
            Some(format!("#{member_id} {plan} until {end} {}", sale.or_number)),
        )
        .await?;
        txn.commit().await?;

        Ok(MembershipSaleResponse {
            member: self.to_response(updated, today),
            transaction: sale.into(),
        })
    }

    pub async fn cancel_membership(
        &self,
        actor: &AuthUser,
        member_id: i32,
    ) -> AppResult<MemberResponse> {
        actor.require_staff()?;

        let txn = self.pool.begin().await?;
        let existing = Self::find_model(&txn, member_id).await?;
        if existing.cancelled_at.is_some() {
            return Err(AppError::Conflict("Membership is already cancelled".to_string()));
        }
        let mut model = existing.into_active_model();
        model.cancelled_at = Set(Some(Utc::now()));
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;

        AuditService::record(&txn, actor, "member.cancel", Some(format!("#{member_id}"))).await?;
        txn.commit().await?;

        Ok(self.to_response(updated, local_today()))
    }

    /// Hard delete for members whose only history is their enrolment receipt.
    ///
    /// The receipt stays in the sales ledger with its member link cleared.
    pub async fn delete_member(&self, actor: &AuthUser, member_id: i32) -> AppResult<()> {
        actor.require_admin()?;

        let txn = self.pool.begin().await?;
        let existing = Self::find_model(&txn, member_id).await?;

        let visits = attendance::Entity::find()
            .filter(attendance::Column::MemberId.eq(member_id))
            .count(&txn)
            .await?;
        let enrolment_receipt = periods::Entity::find()
            .filter(periods::Column::MemberId.eq(member_id))
            .order_by_asc(periods::Column::Id)
            .one(&txn)
            .await?
            .and_then(|p| p.transaction_id);
        let mut later_sales =
            transactions::Entity::find().filter(transactions::Column::MemberId.eq(member_id));
        if let Some(receipt_id) = enrolment_receipt {
            later_sales = later_sales.filter(transactions::Column::Id.ne(receipt_id));
        }
        let later_sales = later_sales.count(&txn).await?;
        if visits > 0 || later_sales > 0 {
            return Err(AppError::Conflict(
                "Member has attendance or sales history; cancel the membership instead"
                    .to_string(),
            ));
        }

        if let Some(receipt_id) = enrolment_receipt
            && let Some(receipt) = transactions::Entity::find_by_id(receipt_id).one(&txn).await?
        {
            let mut receipt = receipt.into_active_model();
            receipt.member_id = Set(None);
            receipt.update(&txn).await?;
        }

        members::Entity::delete_by_id(member_id).exec(&txn).await?;
        AuditService::record(
            &txn,
            actor,
            "member.delete",
            Some(format!("#{member_id} {}", existing.name)),
        )
        .await?;
        txn.commit().await?;

        log::info!("Deleted member #{member_id}");
        Ok(())
    }

    pub async fn status_summary(&self) -> AppResult<MemberStatusSummary> {
        let today = local_today();
        let rows = members::Entity::find().all(&self.pool).await?;
        let mut summary = MemberStatusSummary::default();
        for m in &rows {
            summary.add(self.status_of(m, today));
        }
        Ok(summary)
    }
}
