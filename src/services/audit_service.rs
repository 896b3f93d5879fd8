use crate::entities::{Role, audit_entity as audit};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

pub const CLIENT_ACTION_PREFIX: &str = "client.";

/// Namespaced action name for a client report: lowercase ASCII letters,
/// digits, `.`, `_` and `-` only.
fn client_action_name(raw: &str) -> AppResult<String> {
    let action = raw.trim().to_ascii_lowercase();
    let max = 64 - CLIENT_ACTION_PREFIX.len();
    if action.is_empty() || action.len() > max {
        return Err(AppError::ValidationError(format!(
            "Action must be between 1 and {max} characters"
        )));
    }
    if !action
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        return Err(AppError::ValidationError(
            "Action may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(format!("{CLIENT_ACTION_PREFIX}{action}"))
}

/// Append-only action log; nothing here updates or deletes entries.
#[derive(Clone)]
pub struct AuditService {
    pool: DatabaseConnection,
}

impl AuditService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Appends an entry on `conn`, which may be an open transaction so the entry
    /// commits (or rolls back) together with the change it describes.
    pub async fn record<C: ConnectionTrait>(
        conn: &C,
        actor: &AuthUser,
        action: &str,
        details: Option<String>,
    ) -> AppResult<()> {
        audit::ActiveModel {
            account_id: Set(Some(actor.account_id)),
            username: Set(actor.username.clone()),
            role: Set(actor.role),
            action: Set(action.to_string()),
            details: Set(details),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    /// Entry written by the server itself (startup, background tasks).
    pub async fn record_system<C: ConnectionTrait>(
        conn: &C,
        action: &str,
        details: Option<String>,
    ) -> AppResult<()> {
        audit::ActiveModel {
            account_id: Set(None),
            username: Set("system".to_string()),
            role: Set(Role::Admin),
            action: Set(action.to_string()),
            details: Set(details),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    /// Actions reported by the portals themselves (logout, page-level events).
    /// They are stored under [`CLIENT_ACTION_PREFIX`] so they never pass for
    /// server-written entries.
    pub async fn record_client_action(
        &self,
        actor: &AuthUser,
        request: CreateAuditEntryRequest,
    ) -> AppResult<AuditEntryResponse> {
        let action = client_action_name(&request.action)?;

        let model = audit::ActiveModel {
            account_id: Set(Some(actor.account_id)),
            username: Set(actor.username.clone()),
            role: Set(actor.role),
            action: Set(action),
            details: Set(request.details),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model.into())
    }

    pub async fn list(&self, query: &AuditQuery) -> AppResult<PaginatedResponse<AuditEntryResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = audit::Entity::find();
        if let Some(username) = query.username.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(audit::Column::Username.eq(username));
        }
        if let Some(action) = query.action.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(audit::Column::Action.eq(action));
        }
        if let Some(from) = query.from {
            select = select.filter(audit::Column::CreatedAt.gte(day_start(from)));
        }
        if let Some(to) = query.to {
            select = select.filter(audit::Column::CreatedAt.lt(day_end_exclusive(to)));
        }

        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_desc(audit::Column::CreatedAt)
            .order_by_desc(audit::Column::Id)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    fn admin() -> AuthUser {
        AuthUser {
            account_id: 1,
            username: "admin".into(),
            role: Role::Admin,
            member_id: None,
            trainer_id: None,
        }
    }

    #[tokio::test]
    async fn test_entries_are_listed_newest_first_and_filterable() {
        let db = setup_test_db().await;
        let svc = AuditService::new(db.clone());

        AuditService::record(&db, &admin(), "member.create", Some("id=1".into()))
            .await
            .unwrap();
        AuditService::record_system(&db, "attendance.auto_close", None)
            .await
            .unwrap();
        svc.record_client_action(
            &admin(),
            CreateAuditEntryRequest {
                action: "logout".into(),
                details: None,
            },
        )
        .await
        .unwrap();

        let all = svc
            .list(&AuditQuery {
                username: None,
                action: None,
                from: None,
                to: None,
                page: None,
                page_size: None,
            })
            .await
            .unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.data[0].action, "client.logout");

        let by_user = svc
            .list(&AuditQuery {
                username: Some("system".into()),
                action: None,
                from: None,
                to: None,
                page: None,
                page_size: None,
            })
            .await
            .unwrap();
        assert_eq!(by_user.total, 1);
        assert_eq!(by_user.data[0].account_id, None);
    }

    #[tokio::test]
    async fn test_blank_client_action_is_rejected() {
        let db = setup_test_db().await;
        let svc = AuditService::new(db);
        let err = svc
            .record_client_action(
                &admin(),
                CreateAuditEntryRequest {
                    action: "   ".into(),
                    details: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_client_actions_cannot_pose_as_server_entries() {
        let db = setup_test_db().await;
        let svc = AuditService::new(db);

        let entry = svc
            .record_client_action(
                &admin(),
                CreateAuditEntryRequest {
                    action: "member.delete".into(),
                    details: Some("#1".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(entry.action, "client.member.delete");

        let server_named = svc
            .list(&AuditQuery {
                username: None,
                action: Some("member.delete".into()),
                from: None,
                to: None,
                page: None,
                page_size: None,
            })
            .await
            .unwrap();
        assert_eq!(server_named.total, 0);

        let err = svc
            .record_client_action(
                &admin(),
                CreateAuditEntryRequest {
                    action: "drop table; --".into(),
                    details: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
