// src/handlers/sales.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        filter::{FilterCriteria, SalesQueryParams},
        sales::{FilterOptions, SalesPage},
    },
};

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SalesQueryParams),
    responses(
        (status = 200, description = "Página de vendas filtrada, ordenada e com resumo", body = SalesPage),
        (status = 500, description = "Falha no banco de dados")
    )
)]
pub async fn get_sales(
    State(app_state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    // Pares crus: parâmetro malformado ou repetido nunca vira 400.
    let params = SalesQueryParams::from_pairs(pairs);
    let criteria = FilterCriteria::from_params(&params);
    tracing::debug!(?criteria, "consulta de vendas");

    let page = app_state
        .sales_service
        .query(&app_state.db_pool, &criteria)
        .await?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/sales/filters
#[utoipa::path(
    get,
    path = "/api/sales/filters",
    tag = "Sales",
    responses(
        (status = 200, description = "Valores distintos de cada filtro", body = FilterOptions),
        (status = 500, description = "Falha no banco de dados")
    )
)]
pub async fn get_filters(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let options = app_state
        .sales_service
        .filter_options(&app_state.db_pool)
        .await?;

    Ok((StatusCode::OK, Json(options)))
}

// DELETE /api/sales/cache
#[utoipa::path(
    delete,
    path = "/api/sales/cache",
    tag = "Sales",
    responses(
        (status = 204, description = "Snapshot descartado; a próxima consulta recarrega do banco")
    )
)]
pub async fn invalidate_cache(State(app_state): State<AppState>) -> StatusCode {
    app_state.sales_service.invalidate_cache().await;
    StatusCode::NO_CONTENT
}
