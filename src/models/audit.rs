use crate::entities::{Role, audit_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAuditEntryRequest {
    /// Stored as `client.<action>`.
    #[schema(example = "logout")]
    pub action: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntryResponse {
    pub id: i32,
    pub account_id: Option<i32>,
    pub username: String,
    pub role: Role,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_entity::Model> for AuditEntryResponse {
    fn from(m: audit_entity::Model) -> Self {
        Self {
            id: m.id,
            account_id: m.account_id,
            username: m.username,
            role: m.role,
            action: m.action,
            details: m.details,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct AuditQuery {
    pub username: Option<String>,
    pub action: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}
