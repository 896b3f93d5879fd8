use crate::entities::{PaymentMethod, transaction_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    #[schema(example = "Protein Shake")]
    pub product: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Unit price in centavos.
    #[schema(example = 12000)]
    pub unit_amount: i64,
    pub member_id: Option<i32>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    #[schema(example = "OR-20250903-00001")]
    pub or_number: String,
    pub member_id: Option<i32>,
    pub product: String,
    pub quantity: i32,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub cashier_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(m: transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            or_number: m.or_number,
            member_id: m.member_id,
            product: m.product,
            quantity: m.quantity,
            amount: m.amount,
            payment_method: m.payment_method,
            cashier_id: m.cashier_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct TransactionQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matches OR number or product.
    pub search: Option<String>,
    pub member_id: Option<i32>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct SalesSummaryQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductTotal {
    pub product: String,
    pub quantity: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub date: NaiveDate,
    pub transaction_count: u64,
    pub total_amount: i64,
    pub by_product: Vec<ProductTotal>,
}
