// src/db/sales_repo.rs

use sqlx::{Acquire, Executor, Postgres, QueryBuilder};

use crate::{
    common::error::AppError,
    models::{
        filter::{FilterCriteria, SortField, SortOrder, SortSpec},
        sales::{SaleRecord, SaleRow, Summary, SummaryRow, join_tags},
    },
    services::sales_query::PageWindow,
};

const SALE_COLUMNS: &str = "id, transaction_id, date, \
    customer_id, customer_name, phone_number, gender, age, customer_region, customer_type, \
    product_id, product_name, brand, product_category, tags, \
    quantity, price_per_unit, discount_percentage, total_amount, final_amount, \
    payment_method, order_status, delivery_type, \
    store_id, store_location, \
    salesperson_id, employee_name";

// Mesmas colunas, sem o id (gerado pelo banco)
const INSERT_COLUMNS: &str = "INSERT INTO sales (transaction_id, date, \
    customer_id, customer_name, phone_number, gender, age, customer_region, customer_type, \
    product_id, product_name, brand, product_category, tags, \
    quantity, price_per_unit, discount_percentage, total_amount, final_amount, \
    payment_method, order_status, delivery_type, \
    store_id, store_location, \
    salesperson_id, employee_name) ";

/// 26 colunas x 2000 linhas fica abaixo do limite de 65535 binds do Postgres.
pub const INSERT_BATCH_SIZE: usize = 2000;

/// Colunas com seletor no frontend. O nome da coluna nunca vem do cliente.
#[derive(Debug, Clone, Copy)]
pub enum OptionColumn {
    Region,
    Gender,
    ProductCategory,
    PaymentMethod,
}

impl OptionColumn {
    fn column(self) -> &'static str {
        match self {
            OptionColumn::Region => "customer_region",
            OptionColumn::Gender => "gender",
            OptionColumn::ProductCategory => "product_category",
            OptionColumn::PaymentMethod => "payment_method",
        }
    }
}

// =========================================================================
//  CONSTRUÇÃO DO WHERE
// =========================================================================

fn open_clause(qb: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

fn push_in_clause(
    qb: &mut QueryBuilder<'_, Postgres>,
    first: &mut bool,
    column: &str,
    values: &[String],
) {
    if values.is_empty() {
        return;
    }
    open_clause(qb, first);
    qb.push(column).push(" = ANY(").push_bind(values.to_vec()).push(")");
}

/// Uma cláusula por dimensão ativa, todas com AND e só parâmetros ligados.
/// `strpos` em vez de LIKE para `%` e `_` na busca não virarem curinga.
pub fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, criteria: &FilterCriteria) {
    let mut first = true;

    if let Some(search) = &criteria.search {
        open_clause(qb, &mut first);
        qb.push("(strpos(LOWER(customer_name), ")
            .push_bind(search.to_lowercase())
            .push(") > 0 OR strpos(phone_number, ")
            .push_bind(search.clone())
            .push(") > 0)");
    }

    push_in_clause(qb, &mut first, "customer_region", &criteria.regions);
    push_in_clause(qb, &mut first, "gender", &criteria.genders);
    push_in_clause(qb, &mut first, "product_category", &criteria.product_categories);
    push_in_clause(qb, &mut first, "payment_method", &criteria.payment_methods);

    if !criteria.tags.is_empty() {
        open_clause(qb, &mut first);
        qb.push("(");
        for (i, tag) in criteria.tags.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("strpos(tags, ").push_bind(tag.clone()).push(") > 0");
        }
        qb.push(")");
    }

    if let Some(min) = criteria.age_min {
        open_clause(qb, &mut first);
        qb.push("age >= ").push_bind(min);
    }
    if let Some(max) = criteria.age_max {
        open_clause(qb, &mut first);
        qb.push("age <= ").push_bind(max);
    }

    if let Some(from) = criteria.date_from {
        open_clause(qb, &mut first);
        qb.push("date >= ").push_bind(from);
    }
    if let Some(to) = criteria.date_to {
        open_clause(qb, &mut first);
        qb.push("date <= ").push_bind(to);
    }
}

/// Nulos por último nas duas direções; `id` desempata para a ordem ser estável.
/// COLLATE "C" deixa a comparação de nomes igual à ordem por bytes do motor em memória.
pub fn order_by(sort: SortSpec) -> &'static str {
    match (sort.field, sort.order) {
        (SortField::Date, SortOrder::Asc) => "date ASC NULLS LAST, id ASC",
        (SortField::Date, SortOrder::Desc) => "date DESC NULLS LAST, id ASC",
        (SortField::Quantity, SortOrder::Asc) => "quantity ASC NULLS LAST, id ASC",
        (SortField::Quantity, SortOrder::Desc) => "quantity DESC NULLS LAST, id ASC",
        (SortField::CustomerName, SortOrder::Asc) => {
            "LOWER(customer_name) COLLATE \"C\" ASC NULLS LAST, id ASC"
        }
        (SortField::CustomerName, SortOrder::Desc) => {
            "LOWER(customer_name) COLLATE \"C\" DESC NULLS LAST, id ASC"
        }
    }
}

#[derive(Clone, Default)]
pub struct SalesRepository;

impl SalesRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn count<'e, E>(&self, executor: E, criteria: &FilterCriteria) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM sales");
        push_filters(&mut qb, criteria);

        let total = qb.build_query_scalar::<i64>().fetch_one(executor).await?;
        Ok(total)
    }

    pub async fn summary<'e, E>(
        &self,
        executor: E,
        criteria: &FilterCriteria,
    ) -> Result<Summary, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                COALESCE(SUM(quantity), 0)::BIGINT            AS total_units,
                COALESCE(SUM(final_amount), 0)                AS total_amount,
                COALESCE(SUM(total_amount - final_amount), 0) AS total_discount
            FROM sales"#,
        );
        push_filters(&mut qb, criteria);

        let row = qb.build_query_as::<SummaryRow>().fetch_one(executor).await?;
        Ok(row.into())
    }

    pub async fn fetch_page<'e, E>(
        &self,
        executor: E,
        criteria: &FilterCriteria,
        window: &PageWindow,
    ) -> Result<Vec<SaleRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {SALE_COLUMNS} FROM sales"));
        push_filters(&mut qb, criteria);
        qb.push(" ORDER BY ")
            .push(order_by(criteria.sort))
            .push(" LIMIT ")
            .push_bind(window.page_size)
            .push(" OFFSET ")
            .push_bind(window.offset());

        let rows = qb.build_query_as::<SaleRow>().fetch_all(executor).await?;
        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    /// Tabela inteira em ordem de inserção (carga do snapshot).
    pub async fn fetch_all<'e, E>(&self, executor: E) -> Result<Vec<SaleRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY id ASC");
        let rows = sqlx::query_as::<_, SaleRow>(&sql).fetch_all(executor).await?;
        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    pub async fn distinct_values<'e, E>(
        &self,
        executor: E,
        column: OptionColumn,
    ) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let col = column.column();
        let sql = format!(
            "SELECT DISTINCT {col} FROM sales WHERE {col} IS NOT NULL AND btrim({col}) <> ''"
        );
        let values = sqlx::query_scalar::<_, String>(&sql).fetch_all(executor).await?;
        Ok(values)
    }

    /// Texto cru das tags; quem chama faz o split.
    pub async fn raw_tags<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let values = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT tags FROM sales WHERE tags IS NOT NULL AND tags <> ''",
        )
        .fetch_all(executor)
        .await?;
        Ok(values)
    }

    // =========================================================================
    //  IMPORTAÇÃO
    // =========================================================================

    /// Troca todo o conteúdo da tabela numa transação só.
    pub async fn replace_all<'e, E>(&self, executor: E, records: &[SaleRecord]) -> Result<u64, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let removed = sqlx::query("DELETE FROM sales").execute(&mut *tx).await?.rows_affected();
        tracing::info!("🧹 {} vendas antigas removidas", removed);

        let mut inserted: u64 = 0;
        for chunk in records.chunks(INSERT_BATCH_SIZE) {
            let mut qb = QueryBuilder::<Postgres>::new(INSERT_COLUMNS);
            qb.push_values(chunk, |mut b, r| {
                let tags = (!r.tags.is_empty()).then(|| join_tags(&r.tags));
                b.push_bind(r.transaction_id.clone())
                    .push_bind(r.date)
                    .push_bind(r.customer_id.clone())
                    .push_bind(r.customer_name.clone())
                    .push_bind(r.phone_number.clone())
                    .push_bind(r.gender.clone())
                    .push_bind(r.age)
                    .push_bind(r.customer_region.clone())
                    .push_bind(r.customer_type.clone())
                    .push_bind(r.product_id.clone())
                    .push_bind(r.product_name.clone())
                    .push_bind(r.brand.clone())
                    .push_bind(r.product_category.clone())
                    .push_bind(tags)
                    .push_bind(r.quantity)
                    .push_bind(r.price_per_unit)
                    .push_bind(r.discount_percentage)
                    .push_bind(r.total_amount)
                    .push_bind(r.final_amount)
                    .push_bind(r.payment_method.clone())
                    .push_bind(r.order_status.clone())
                    .push_bind(r.delivery_type.clone())
                    .push_bind(r.store_id.clone())
                    .push_bind(r.store_location.clone())
                    .push_bind(r.salesperson_id.clone())
                    .push_bind(r.employee_name.clone());
            });

            inserted += qb.build().execute(&mut *tx).await?.rows_affected();
            tracing::info!("📦 {} linhas inseridas", inserted);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn count_sql(criteria: &FilterCriteria) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM sales");
        push_filters(&mut qb, criteria);
        qb.sql().to_string()
    }

    #[test]
    fn no_active_filter_means_no_where() {
        assert_eq!(count_sql(&FilterCriteria::default()), "SELECT COUNT(*) FROM sales");
    }

    #[test]
    fn active_filters_are_and_combined_with_bound_params() {
        let criteria = FilterCriteria {
            search: Some("Ana".into()),
            regions: vec!["North".into(), "South".into()],
            tags: vec!["sale".into(), "eco".into()],
            age_min: Some(30),
            date_to: NaiveDate::from_ymd_opt(2023, 12, 31),
            ..FilterCriteria::default()
        };

        assert_eq!(
            count_sql(&criteria),
            "SELECT COUNT(*) FROM sales \
             WHERE (strpos(LOWER(customer_name), $1) > 0 OR strpos(phone_number, $2) > 0) \
             AND customer_region = ANY($3) \
             AND (strpos(tags, $4) > 0 OR strpos(tags, $5) > 0) \
             AND age >= $6 \
             AND date <= $7"
        );
    }

    #[test]
    fn single_dimension_opens_where() {
        let criteria = FilterCriteria {
            payment_methods: vec!["UPI".into()],
            age_max: Some(40),
            ..FilterCriteria::default()
        };
        assert_eq!(
            count_sql(&criteria),
            "SELECT COUNT(*) FROM sales WHERE payment_method = ANY($1) AND age <= $2"
        );
    }

    #[test]
    fn search_text_is_never_inlined() {
        let criteria = FilterCriteria {
            search: Some("'; DROP TABLE sales; --".into()),
            ..FilterCriteria::default()
        };
        assert!(!count_sql(&criteria).contains("DROP"));
    }

    #[test]
    fn order_by_keeps_nulls_last_and_id_tiebreak() {
        for field in [SortField::Date, SortField::Quantity, SortField::CustomerName] {
            for order in [SortOrder::Asc, SortOrder::Desc] {
                let clause = order_by(SortSpec { field, order });
                assert!(clause.contains("NULLS LAST"), "{clause}");
                assert!(clause.ends_with(", id ASC"), "{clause}");
            }
        }
        assert_eq!(order_by(SortSpec::default()), "date DESC NULLS LAST, id ASC");
    }
}
