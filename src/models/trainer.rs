use crate::entities::trainer_entity;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainerResponse {
    pub id: i32,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub specialty: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTrainerRequest {
    #[schema(example = "Mia Santos")]
    pub name: String,
    #[schema(example = "09181234567")]
    pub contact: String,
    pub email: String,
    #[schema(example = "Strength & Conditioning")]
    pub specialty: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTrainerRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct TrainerQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct ScheduleQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

impl From<trainer_entity::Model> for TrainerResponse {
    fn from(m: trainer_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            contact: m.contact,
            email: m.email,
            specialty: m.specialty,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}
