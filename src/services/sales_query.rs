// src/services/sales_query.rs
//
// Motor de consulta em memória. Mesma semântica do SQL gerado em
// `db::sales_repo`, usado no modo snapshot.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::models::{
    filter::{FilterCriteria, SortField, SortOrder, SortSpec},
    sales::{FilterOptions, PAGE_SIZE, SaleRecord, SalesPage, Summary},
};

/// Limites da página depois do clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PageWindow {
    pub fn new(requested_page: i64, page_size: i64, total_items: i64) -> Self {
        let total_items = total_items.max(0);
        let total_pages = ((total_items + page_size - 1) / page_size).max(1);
        let page = requested_page.clamp(1, total_pages);

        Self {
            page,
            page_size,
            total_items,
            total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

// =========================================================================
//  PREDICADO
// =========================================================================

/// AND de uma cláusula por dimensão ativa. Campo nulo nunca satisfaz cláusula ativa.
pub fn matches(record: &SaleRecord, criteria: &FilterCriteria) -> bool {
    if let Some(search) = &criteria.search {
        let needle = search.to_lowercase();
        let by_name = record
            .customer_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&needle));
        // telefone diferencia maiúsculas
        let by_phone = record
            .phone_number
            .as_deref()
            .is_some_and(|phone| phone.contains(search.as_str()));

        if !(by_name || by_phone) {
            return false;
        }
    }

    if !in_set(&criteria.regions, record.customer_region.as_deref())
        || !in_set(&criteria.genders, record.gender.as_deref())
        || !in_set(&criteria.product_categories, record.product_category.as_deref())
        || !in_set(&criteria.payment_methods, record.payment_method.as_deref())
    {
        return false;
    }

    // Substring no texto cru das tags. Como a tag pedida já vem aparada e sem vírgula,
    // procurar em cada tag aparada dá o mesmo resultado.
    if !criteria.tags.is_empty()
        && !criteria
            .tags
            .iter()
            .any(|wanted| record.tags.iter().any(|tag| tag.contains(wanted.as_str())))
    {
        return false;
    }

    if let Some(min) = criteria.age_min {
        if !record.age.is_some_and(|age| age >= min) {
            return false;
        }
    }
    if let Some(max) = criteria.age_max {
        if !record.age.is_some_and(|age| age <= max) {
            return false;
        }
    }

    if let Some(from) = criteria.date_from {
        if !record.date.is_some_and(|date| date >= from) {
            return false;
        }
    }
    if let Some(to) = criteria.date_to {
        if !record.date.is_some_and(|date| date <= to) {
            return false;
        }
    }

    true
}

fn in_set(selected: &[String], value: Option<&str>) -> bool {
    selected.is_empty() || value.is_some_and(|v| selected.iter().any(|s| s == v))
}

// =========================================================================
//  ORDENAÇÃO
// =========================================================================

/// Nulos sempre no fim, nas duas direções.
fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match order {
            SortOrder::Asc => x.cmp(&y),
            SortOrder::Desc => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare(a: &SaleRecord, b: &SaleRecord, sort: SortSpec) -> Ordering {
    match sort.field {
        SortField::Date => nulls_last(a.date, b.date, sort.order),
        SortField::Quantity => nulls_last(a.quantity, b.quantity, sort.order),
        SortField::CustomerName => nulls_last(
            a.customer_name.as_deref().map(str::to_lowercase),
            b.customer_name.as_deref().map(str::to_lowercase),
            sort.order,
        ),
    }
}

/// Ordenação estável: empates mantêm a ordem de entrada (a carga vem por `id`).
pub fn sort_records(records: &mut [&SaleRecord], sort: SortSpec) {
    records.sort_by(|a, b| compare(a, b, sort));
}

// =========================================================================
//  AGREGAÇÃO
// =========================================================================

pub fn summarize<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Summary {
    let mut total_units: i64 = 0;
    let mut total_amount = Decimal::ZERO;
    let mut total_discount = Decimal::ZERO;

    for record in records {
        total_units += i64::from(record.quantity.unwrap_or(0));
        total_amount += record.final_amount.unwrap_or(Decimal::ZERO);
        if let (Some(total), Some(final_amount)) = (record.total_amount, record.final_amount) {
            total_discount += total - final_amount;
        }
    }

    Summary::new(total_units, total_amount, total_discount)
}

// =========================================================================
//  CONSULTA COMPLETA
// =========================================================================

pub fn run_query(records: &[SaleRecord], criteria: &FilterCriteria) -> SalesPage {
    let mut matched: Vec<&SaleRecord> = records.iter().filter(|r| matches(r, criteria)).collect();

    // O resumo é sobre o conjunto filtrado inteiro, antes da paginação.
    let summary = summarize(matched.iter().copied());
    let window = PageWindow::new(criteria.page, PAGE_SIZE, matched.len() as i64);

    sort_records(&mut matched, criteria.sort);

    let data = matched
        .into_iter()
        .skip(window.offset() as usize)
        .take(window.page_size as usize)
        .cloned()
        .collect();

    SalesPage {
        data,
        page: window.page,
        page_size: window.page_size,
        total_items: window.total_items,
        total_pages: window.total_pages,
        summary,
    }
}

// =========================================================================
//  OPÇÕES DOS FILTROS
// =========================================================================

fn push_value(set: &mut BTreeSet<String>, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        set.insert(v.to_string());
    }
}

pub fn collect_filter_options(records: &[SaleRecord]) -> FilterOptions {
    let mut regions = BTreeSet::new();
    let mut genders = BTreeSet::new();
    let mut categories = BTreeSet::new();
    let mut tags = BTreeSet::new();
    let mut payment_methods = BTreeSet::new();

    for record in records {
        push_value(&mut regions, record.customer_region.as_deref());
        push_value(&mut genders, record.gender.as_deref());
        push_value(&mut categories, record.product_category.as_deref());
        push_value(&mut payment_methods, record.payment_method.as_deref());
        for tag in &record.tags {
            push_value(&mut tags, Some(tag));
        }
    }

    FilterOptions {
        regions: regions.into_iter().collect(),
        genders: genders.into_iter().collect(),
        product_categories: categories.into_iter().collect(),
        tags: tags.into_iter().collect(),
        payment_methods: payment_methods.into_iter().collect(),
    }
}
