// src/services/import_service.rs

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sqlx::PgPool;

use crate::{
    common::{error::AppError, query_parser::parse_date},
    db::SalesRepository,
    models::sales::{SaleRecord, split_tags},
};

#[derive(Debug)]
pub struct ParsedSales {
    pub records: Vec<SaleRecord>,
    pub skipped: usize,
}

// Números do CSV podem vir com separador de milhar ("1,299.50").
// Vazio ou inválido vira 0.
fn to_number(value: Option<&str>) -> Decimal {
    let Some(raw) = value else {
        return Decimal::ZERO;
    };
    let cleaned = raw.replace(',', "");
    cleaned
        .parse::<Decimal>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().and_then(|n| Decimal::try_from(n).ok()))
        .unwrap_or(Decimal::ZERO)
}

fn to_integer(value: Option<&str>) -> i32 {
    to_number(value).trunc().to_i32().unwrap_or(0)
}

fn to_date(value: Option<&str>) -> Option<NaiveDate> {
    parse_date(value).or_else(|| {
        value.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y").ok())
    })
}

/// Lê o CSV do dataset de varejo. Linhas malformadas são puladas com aviso.
pub fn parse_sales_csv<R: std::io::Read>(reader: R) -> Result<ParsedSales, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{FEFF}').trim().to_string())
        .collect();

    tracing::info!("Cabeçalhos do CSV: {:?}", headers);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Pulando linha malformada {}: {}", line + 2, e);
                skipped += 1;
                continue;
            }
        };

        // Campo pelo nome do cabeçalho; vazio vira None
        let get_field = |name: &str| -> Option<String> {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .and_then(|i| row.get(i))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        records.push(SaleRecord {
            id: records.len() as i64 + 1,
            transaction_id: get_field("Transaction ID"),
            date: to_date(get_field("Date").as_deref()),

            customer_id: get_field("Customer ID"),
            customer_name: get_field("Customer Name"),
            phone_number: get_field("Phone Number"),
            gender: get_field("Gender"),
            age: Some(to_integer(get_field("Age").as_deref())),
            customer_region: get_field("Customer Region"),
            customer_type: get_field("Customer Type"),

            product_id: get_field("Product ID"),
            product_name: get_field("Product Name"),
            brand: get_field("Brand"),
            product_category: get_field("Product Category"),
            tags: get_field("Tags").as_deref().map(split_tags).unwrap_or_default(),

            quantity: Some(to_integer(get_field("Quantity").as_deref())),
            price_per_unit: Some(to_number(get_field("Price per Unit").as_deref())),
            discount_percentage: Some(to_number(get_field("Discount Percentage").as_deref())),
            total_amount: Some(to_number(get_field("Total Amount").as_deref())),
            final_amount: Some(to_number(get_field("Final Amount").as_deref())),

            payment_method: get_field("Payment Method"),
            order_status: get_field("Order Status"),
            delivery_type: get_field("Delivery Type"),

            store_id: get_field("Store ID"),
            store_location: get_field("Store Location"),

            salesperson_id: get_field("Salesperson ID"),
            employee_name: get_field("Employee Name"),
        });
    }

    Ok(ParsedSales { records, skipped })
}

/// Importação única: substitui a tabela pelo conteúdo do arquivo.
pub async fn import_file(
    pool: &PgPool,
    repo: &SalesRepository,
    path: &Path,
) -> Result<u64, AppError> {
    tracing::info!("📂 Lendo CSV de: {}", path.display());

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::ImportError(format!("{}: {}", path.display(), e)))?;

    let parsed = parse_sales_csv(bytes.as_slice())?;
    if parsed.skipped > 0 {
        tracing::warn!("{} linhas ignoradas", parsed.skipped);
    }

    let inserted = repo.replace_all(pool, &parsed.records).await?;
    tracing::info!("✅ Total de linhas inseridas: {}", inserted);

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\u{FEFF}Transaction ID,Date,Customer ID,Customer Name,Phone Number,Gender,Age,Customer Region,Customer Type,Product ID,Product Name,Brand,Product Category,Tags,Quantity,Price per Unit,Discount Percentage,Total Amount,Final Amount,Payment Method,Order Status,Delivery Type,Store ID,Store Location,Salesperson ID,Employee Name
1,2023-03-15,C1,Neha Sharma,9876543210,Female,34,North,Regular,P1,Lipstick,Glow,Beauty,\"organic, summer-sale\",3,\"1,200.50\",10,3601.5,3241.35,UPI,Completed,Standard,S1,Delhi,E1,Ravi
2,not-a-date,C2,,,Male,,South,New,P2,Shirt,Wear,Clothing,,x,100,0,100,100,Cash,Completed,Express,S2,Mumbai,E2,Asha
";

    #[test]
    fn parses_retail_dataset_rows() {
        let parsed = parse_sales_csv(CSV.as_bytes()).expect("csv válido");
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.records.len(), 2);

        let first = &parsed.records[0];
        assert_eq!(first.transaction_id.as_deref(), Some("1"));
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(first.customer_name.as_deref(), Some("Neha Sharma"));
        assert_eq!(first.age, Some(34));
        assert_eq!(first.tags, vec!["organic", "summer-sale"]);
        assert_eq!(first.price_per_unit, Some(Decimal::new(120050, 2)));
        assert_eq!(first.final_amount, Some(Decimal::new(324135, 2)));
    }

    #[test]
    fn blanks_and_garbage_degrade_to_defaults() {
        let parsed = parse_sales_csv(CSV.as_bytes()).expect("csv válido");
        let second = &parsed.records[1];

        assert_eq!(second.date, None);
        assert_eq!(second.customer_name, None);
        assert_eq!(second.age, Some(0));
        assert_eq!(second.quantity, Some(0));
        assert!(second.tags.is_empty());
    }

    #[test]
    fn number_coercion() {
        assert_eq!(to_number(Some("1,000")), Decimal::new(1000, 0));
        assert_eq!(to_number(Some("abc")), Decimal::ZERO);
        assert_eq!(to_number(None), Decimal::ZERO);
        assert_eq!(to_integer(Some("42.9")), 42);
    }

    #[test]
    fn us_style_dates_are_accepted() {
        assert_eq!(to_date(Some("03/15/2023")), NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(to_date(Some("")), None);
    }
}
