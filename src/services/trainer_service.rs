use crate::entities::{SessionStatus, session_entity as sessions, trainer_entity as trainers};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::AuditService;
use crate::utils::*;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct TrainerService {
    pool: DatabaseConnection,
}

impl TrainerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub(crate) async fn find_model<C: ConnectionTrait>(
        conn: &C,
        trainer_id: i32,
    ) -> AppResult<trainers::Model> {
        trainers::Entity::find_by_id(trainer_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trainer {trainer_id} not found")))
    }

    /// Trainers that can be assigned to a new booking.
    pub(crate) async fn find_active<C: ConnectionTrait>(
        conn: &C,
        trainer_id: i32,
    ) -> AppResult<trainers::Model> {
        let trainer = Self::find_model(conn, trainer_id).await?;
        if !trainer.is_active {
            return Err(AppError::ValidationError(format!(
                "Trainer {} is not taking sessions",
                trainer.name
            )));
        }
        Ok(trainer)
    }

    async fn ensure_email_free<C: ConnectionTrait>(
        conn: &C,
        email: &str,
        except_id: Option<i32>,
    ) -> AppResult<()> {
        let mut q = trainers::Entity::find().filter(trainers::Column::Email.eq(email));
        if let Some(id) = except_id {
            q = q.filter(trainers::Column::Id.ne(id));
        }
        if q.count(conn).await? > 0 {
            return Err(AppError::Conflict(format!(
                "Email {email} is already registered to a trainer"
            )));
        }
        Ok(())
    }

    pub async fn list_trainers(&self, query: &TrainerQuery) -> AppResult<Vec<TrainerResponse>> {
        let mut select = trainers::Entity::find();
        if query.active_only {
            select = select.filter(trainers::Column::IsActive.eq(true));
        }
        let rows = select
            .order_by_asc(trainers::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_trainer(&self, trainer_id: i32) -> AppResult<TrainerResponse> {
        Ok(Self::find_model(&self.pool, trainer_id).await?.into())
    }

    pub async fn create_trainer(
        &self,
        actor: &AuthUser,
        request: CreateTrainerRequest,
    ) -> AppResult<TrainerResponse> {
        actor.require_admin()?;

        validate_name(&request.name)?;
        let contact = normalize_contact(&request.contact);
        validate_contact(&contact)?;
        let email = normalize_email(&request.email);
        validate_email(&email)?;

        let txn = self.pool.begin().await?;
        Self::ensure_email_free(&txn, &email, None).await?;

        let now = Utc::now();
        let trainer = trainers::ActiveModel {
            name: Set(request.name.trim().to_string()),
            contact: Set(contact),
            email: Set(email),
            specialty: Set(request
                .specialty
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        AuditService::record(
            &txn,
            actor,
            "trainer.create",
            Some(format!("#{} {}", trainer.id, trainer.name)),
        )
        .await?;
        txn.commit().await?;
        Ok(trainer.into())
    }

    pub async fn update_trainer(
        &self,
        actor: &AuthUser,
        trainer_id: i32,
        request: UpdateTrainerRequest,
    ) -> AppResult<TrainerResponse> {
        actor.require_admin()?;

        if let Some(n) = &request.name {
            validate_name(n)?;
        }
        let contact = request.contact.as_deref().map(normalize_contact);
        if let Some(c) = &contact {
            validate_contact(c)?;
        }
        let email = request.email.as_deref().map(normalize_email);
        if let Some(e) = &email {
            validate_email(e)?;
        }

        let txn = self.pool.begin().await?;
        let existing = Self::find_model(&txn, trainer_id).await?;
        if let Some(e) = &email {
            Self::ensure_email_free(&txn, e, Some(trainer_id)).await?;
        }

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
        if let Some(s) = request.specialty {
            let s = s.trim().to_string();
            model.specialty = Set((!s.is_empty()).then_some(s));
        }
        if let Some(active) = request.is_active {
            model.is_active = Set(active);
        }
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;

        AuditService::record(&txn, actor, "trainer.update", Some(format!("#{trainer_id}")))
            .await?;
        txn.commit().await?;
        Ok(updated.into())
    }

    /// Approved sessions for one trainer on `date`, earliest first.
    pub async fn schedule(
        &self,
        trainer_id: i32,
        date: NaiveDate,
    ) -> AppResult<Vec<SessionResponse>> {
        Self::find_model(&self.pool, trainer_id).await?;
        let rows = sessions::Entity::find()
            .filter(sessions::Column::TrainerId.eq(trainer_id))
            .filter(sessions::Column::Date.eq(date))
            .filter(sessions::Column::Status.eq(SessionStatus::Approved))
            .order_by_asc(sessions::Column::TimeIn)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::entities::Role;

    fn admin() -> AuthUser {
        AuthUser {
            account_id: 1,
            username: "admin".into(),
            role: Role::Admin,
            member_id: None,
            trainer_id: None,
        }
    }

    fn coach(name: &str) -> CreateTrainerRequest {
        CreateTrainerRequest {
            name: name.into(),
            contact: "09181234567".into(),
            email: format!("{}@gym.test", name.to_lowercase()),
            specialty: Some("  Boxing ".into()),
        }
    }

    #[tokio::test]
    async fn test_create_and_deactivate_trainer() {
        let db = setup_test_db().await;
        let svc = TrainerService::new(db.clone());

        let created = svc.create_trainer(&admin(), coach("Mia")).await.unwrap();
        assert_eq!(created.specialty.as_deref(), Some("Boxing"));
        assert!(created.is_active);

        let updated = svc
            .update_trainer(
                &admin(),
                created.id,
                UpdateTrainerRequest {
                    name: None,
                    contact: None,
                    email: None,
                    specialty: Some(String::new()),
                    is_active: Some(false),
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert!(updated.specialty.is_none());

        let active = svc
            .list_trainers(&TrainerQuery { active_only: true })
            .await
            .unwrap();
        assert!(active.is_empty());
        assert!(matches!(
            TrainerService::find_active(&db, created.id).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_only_admin_manages_trainers() {
        let db = setup_test_db().await;
        let svc = TrainerService::new(db);
        let mut cashier = admin();
        cashier.role = Role::Cashier;

        let err = svc.create_trainer(&cashier, coach("Mia")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_duplicate_trainer_email() {
        let db = setup_test_db().await;
        let svc = TrainerService::new(db);
        svc.create_trainer(&admin(), coach("Mia")).await.unwrap();
        let err = svc.create_trainer(&admin(), coach("MIA")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
