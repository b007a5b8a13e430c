// src/models/sales.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Itens por página. Fixo, o cliente não escolhe.
pub const PAGE_SIZE: i64 = 10;

/// Taxa canônica INR -> SAR. O frontend não converte mais por conta própria.
pub const SAR_PER_INR: Decimal = Decimal::from_parts(4515, 0, 0, false, 5);

// --- 1. Venda (uma linha = uma transação) ---
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: i64,
    pub transaction_id: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2023-03-15")]
    pub date: Option<NaiveDate>,

    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub customer_region: Option<String>,
    pub customer_type: Option<String>,

    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub product_category: Option<String>,
    #[schema(example = json!(["organic", "summer-sale"]))]
    pub tags: Vec<String>,

    pub quantity: Option<i32>,
    pub price_per_unit: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub final_amount: Option<Decimal>,

    pub payment_method: Option<String>,
    pub order_status: Option<String>,
    pub delivery_type: Option<String>,

    pub store_id: Option<String>,
    pub store_location: Option<String>,

    pub salesperson_id: Option<String>,
    pub employee_name: Option<String>,
}

// Linha crua da tabela `sales`. As tags ficam como texto separado por vírgula.
#[derive(Debug, Clone, FromRow)]
pub struct SaleRow {
    pub id: i64,
    pub transaction_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub customer_region: Option<String>,
    pub customer_type: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub product_category: Option<String>,
    pub tags: Option<String>,
    pub quantity: Option<i32>,
    pub price_per_unit: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub final_amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub order_status: Option<String>,
    pub delivery_type: Option<String>,
    pub store_id: Option<String>,
    pub store_location: Option<String>,
    pub salesperson_id: Option<String>,
    pub employee_name: Option<String>,
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        Self {
            id: row.id,
            transaction_id: row.transaction_id,
            date: row.date,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            phone_number: row.phone_number,
            gender: row.gender,
            age: row.age,
            customer_region: row.customer_region,
            customer_type: row.customer_type,
            product_id: row.product_id,
            product_name: row.product_name,
            brand: row.brand,
            product_category: row.product_category,
            tags: row.tags.as_deref().map(split_tags).unwrap_or_default(),
            quantity: row.quantity,
            price_per_unit: row.price_per_unit,
            discount_percentage: row.discount_percentage,
            total_amount: row.total_amount,
            final_amount: row.final_amount,
            payment_method: row.payment_method,
            order_status: row.order_status,
            delivery_type: row.delivery_type,
            store_id: row.store_id,
            store_location: row.store_location,
            salesperson_id: row.salesperson_id,
            employee_name: row.employee_name,
        }
    }
}

// Formato persistido das tags: "a,b,c"
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// --- 2. Resumo (sobre o conjunto filtrado inteiro, nunca só a página) ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotals {
    #[schema(example = "SAR")]
    pub currency: String,
    pub rate: Decimal,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_units: i64,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
    pub secondary_currency: CurrencyTotals,
}

impl Summary {
    pub fn new(total_units: i64, total_amount: Decimal, total_discount: Decimal) -> Self {
        let secondary_currency = CurrencyTotals {
            currency: "SAR".to_string(),
            rate: SAR_PER_INR,
            total_amount: (total_amount * SAR_PER_INR).round_dp(2),
            total_discount: (total_discount * SAR_PER_INR).round_dp(2),
        };

        Self {
            total_units,
            total_amount,
            total_discount,
            secondary_currency,
        }
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::new(0, Decimal::ZERO, Decimal::ZERO)
    }
}

#[derive(Debug, FromRow)]
pub struct SummaryRow {
    pub total_units: i64,
    pub total_amount: Decimal,
    pub total_discount: Decimal,
}

impl From<SummaryRow> for Summary {
    fn from(row: SummaryRow) -> Self {
        Summary::new(row.total_units, row.total_amount, row.total_discount)
    }
}

// --- 3. Página de resultado ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesPage {
    pub data: Vec<SaleRecord>,
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub summary: Summary,
}

// --- 4. Opções dos seletores (dataset inteiro, sem filtro) ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub genders: Vec<String>,
    pub product_categories: Vec<String>,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
}
