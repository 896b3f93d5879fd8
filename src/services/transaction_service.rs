use crate::entities::{PaymentMethod, member_entity as members, transaction_entity as transactions};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::AuditService;
use crate::utils::*;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// One receipt line to be written.
pub struct NewSale {
    pub member_id: Option<i32>,
    pub product: String,
    pub quantity: i32,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub cashier_id: Option<i32>,
}

#[derive(Clone)]
pub struct TransactionService {
    pool: DatabaseConnection,
    // held from sequence lookup until the inserting transaction commits
    receipt_lock: Arc<Mutex<()>>,
}

impl TransactionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool,
            receipt_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Serialises OR-number assignment. Keep the guard alive until commit.
    pub async fn lock_receipts(&self) -> MutexGuard<'_, ()> {
        self.receipt_lock.lock().await
    }

    async fn next_or_number<C: ConnectionTrait>(conn: &C, date: NaiveDate) -> AppResult<String> {
        let prefix = or_prefix(date);
        let last = transactions::Entity::find()
            .filter(transactions::Column::OrNumber.starts_with(prefix.as_str()))
            .order_by_desc(transactions::Column::OrNumber)
            .one(conn)
            .await?;
        let next = last
            .and_then(|t| parse_sequence(&t.or_number))
            .unwrap_or(0)
            + 1;
        Ok(format_or_number(date, next))
    }

    /// Writes a receipt on `conn`. Callers must hold [`Self::lock_receipts`].
    pub(crate) async fn insert_sale<C: ConnectionTrait>(
        conn: &C,
        sale: NewSale,
    ) -> AppResult<transactions::Model> {
        let or_number = Self::next_or_number(conn, local_today()).await?;
        let model = transactions::ActiveModel {
            or_number: Set(or_number),
            member_id: Set(sale.member_id),
            product: Set(sale.product),
            quantity: Set(sale.quantity),
            amount: Set(sale.amount),
            payment_method: Set(sale.payment_method),
            cashier_id: Set(sale.cashier_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(model)
    }

    pub async fn create_sale(
        &self,
        actor: &AuthUser,
        request: CreateTransactionRequest,
    ) -> AppResult<TransactionResponse> {
        actor.require_staff()?;

        let product = request.product.trim().to_string();
        if product.is_empty() || product.len() > 120 {
            return Err(AppError::ValidationError(
                "Product must be between 1 and 120 characters".to_string(),
            ));
        }
        if request.quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if request.unit_amount <= 0 {
            return Err(AppError::ValidationError(
                "Amount must be greater than zero".to_string(),
            ));
        }
        let amount = request
            .unit_amount
            .checked_mul(i64::from(request.quantity))
            .ok_or_else(|| AppError::ValidationError("Amount is too large".to_string()))?;

        if let Some(member_id) = request.member_id {
            members::Entity::find_by_id(member_id)
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Member {member_id} not found")))?;
        }

        let _guard = self.lock_receipts().await;
        let txn = self.pool.begin().await?;
        let model = Self::insert_sale(
            &txn,
            NewSale {
                member_id: request.member_id,
                product,
                quantity: request.quantity,
                amount,
                payment_method: request.payment_method,
                cashier_id: Some(actor.account_id),
            },
        )
        .await?;
        AuditService::record(
            &txn,
            actor,
            "transaction.create",
            Some(format!("{} {} x{} = {}", model.or_number, model.product, model.quantity, model.amount)),
        )
        .await?;
        txn.commit().await?;

        log::info!("Recorded sale {} ({} centavos)", model.or_number, model.amount);
        Ok(model.into())
    }

    pub async fn list(
        &self,
        query: &TransactionQuery,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = transactions::Entity::find();
        if let Some(from) = query.from {
            select = select.filter(transactions::Column::CreatedAt.gte(day_start(from)));
        }
        if let Some(to) = query.to {
            select = select.filter(transactions::Column::CreatedAt.lt(day_end_exclusive(to)));
        }
        if let Some(member_id) = query.member_id {
            select = select.filter(transactions::Column::MemberId.eq(member_id));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(transactions::Column::OrNumber.contains(search))
                    .add(transactions::Column::Product.contains(search)),
            );
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn get_by_or_number(&self, or_number: &str) -> AppResult<TransactionResponse> {
        transactions::Entity::find()
            .filter(transactions::Column::OrNumber.eq(or_number))
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Receipt {or_number} not found")))
    }

    /// Totals for one local calendar day. Summed in memory so the result does not
    /// depend on how the backend types `SUM(bigint)`.
    pub async fn daily_summary(&self, date: NaiveDate) -> AppResult<SalesSummary> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::CreatedAt.gte(day_start(date)))
            .filter(transactions::Column::CreatedAt.lt(day_end_exclusive(date)))
            .all(&self.pool)
            .await?;

        let mut by_product: BTreeMap<String, ProductTotal> = BTreeMap::new();
        let mut total_amount = 0i64;
        for row in &rows {
            total_amount += row.amount;
            let entry = by_product
                .entry(row.product.clone())
                .or_insert_with(|| ProductTotal {
                    product: row.product.clone(),
                    quantity: 0,
                    amount: 0,
                });
            entry.quantity += i64::from(row.quantity);
            entry.amount += row.amount;
        }

        let mut by_product: Vec<ProductTotal> = by_product.into_values().collect();
        by_product.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.product.cmp(&b.product)));

        Ok(SalesSummary {
            date,
            transaction_count: rows.len() as u64,
            total_amount,
            by_product,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::entities::Role;

    fn cashier() -> AuthUser {
        AuthUser {
            account_id: 2,
            username: "frontdesk".into(),
            role: Role::Cashier,
            member_id: None,
            trainer_id: None,
        }
    }

    fn sale(product: &str, quantity: i32, unit_amount: i64) -> CreateTransactionRequest {
        CreateTransactionRequest {
            product: product.into(),
            quantity,
            unit_amount,
            member_id: None,
            payment_method: PaymentMethod::Cash,
        }
    }

    /// Accounts 1 (admin) and 2 (the cashier used as actor).
    async fn seed_cashier(db: &DatabaseConnection) {
        for (name, password, role) in [
            ("admin", "admin1234", Role::Admin),
            ("frontdesk", "frontdesk1", Role::Cashier),
        ] {
            crate::services::AccountService::insert_account(db, name, password, role, None, None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_or_numbers_are_sequential_per_day() {
        let db = setup_test_db().await;
        seed_cashier(&db).await;
        let svc = TransactionService::new(db);

        let first = svc.create_sale(&cashier(), sale("Water", 2, 2500)).await.unwrap();
        let second = svc.create_sale(&cashier(), sale("Towel", 1, 15000)).await.unwrap();

        assert_eq!(first.amount, 5000);
        assert_eq!(parse_sequence(&first.or_number), Some(1));
        assert_eq!(parse_sequence(&second.or_number), Some(2));
        assert!(first.or_number.starts_with(&or_prefix(local_today())));

        let found = svc.get_by_or_number(&second.or_number).await.unwrap();
        assert_eq!(found.product, "Towel");
    }

    #[tokio::test]
    async fn test_concurrent_sales_get_distinct_receipts() {
        let db = setup_test_db().await;
        seed_cashier(&db).await;
        let svc = TransactionService::new(db);

        let mut handles = Vec::new();
        for i in 0..5 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.create_sale(&cashier(), sale("Gatorade", 1, 6000 + i))
                    .await
                    .map(|t| t.or_number)
            }));
        }
        let mut numbers = Vec::new();
        for h in handles {
            numbers.push(h.await.unwrap().unwrap());
        }
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_sales_are_rejected() {
        let db = setup_test_db().await;
        let svc = TransactionService::new(db);
        assert!(matches!(
            svc.create_sale(&cashier(), sale("Water", 0, 2500)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_sale(&cashier(), sale("Water", 1, 0)).await,
            Err(AppError::ValidationError(_))
        ));
        let trainer = AuthUser {
            role: Role::Trainer,
            ..cashier()
        };
        assert!(matches!(
            svc.create_sale(&trainer, sale("Water", 1, 100)).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_daily_summary_groups_by_product() {
        let db = setup_test_db().await;
        seed_cashier(&db).await;
        let svc = TransactionService::new(db);

        svc.create_sale(&cashier(), sale("Water", 2, 2500)).await.unwrap();
        svc.create_sale(&cashier(), sale("Water", 1, 2500)).await.unwrap();
        svc.create_sale(&cashier(), sale("Protein Shake", 1, 12000)).await.unwrap();

        let summary = svc.daily_summary(local_today()).await.unwrap();
        assert_eq!(summary.transaction_count, 3);
        assert_eq!(summary.total_amount, 19500);
        assert_eq!(summary.by_product[0].product, "Protein Shake");
        assert_eq!(summary.by_product[1].quantity, 3);
        assert_eq!(summary.by_product[1].amount, 7500);

        let list = svc
            .list(&TransactionQuery {
                from: None,
                to: None,
                search: Some("water".into()),
                member_id: None,
                page: None,
                page_size: None,
            })
            .await
            .unwrap();
        // LIKE is case-insensitive for ASCII on SQLite
        assert_eq!(list.total, 2);
    }
}
