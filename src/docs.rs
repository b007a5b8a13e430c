// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sales Dashboard API",
        description = "Consulta de vendas de varejo: busca, filtros, ordenação, paginação e resumo"
    ),
    paths(
        // --- Sales ---
        handlers::sales::get_sales,
        handlers::sales::get_filters,
        handlers::sales::invalidate_cache,
    ),
    components(
        schemas(
            models::sales::SaleRecord,
            models::sales::Summary,
            models::sales::CurrencyTotals,
            models::sales::SalesPage,
            models::sales::FilterOptions,
        )
    ),
    tags(
        (name = "Sales", description = "Transações de varejo e opções de filtro")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_sales_route() {
        let doc = ApiDoc::openapi();
        for path in ["/api/sales", "/api/sales/filters", "/api/sales/cache"] {
            assert!(doc.paths.paths.contains_key(path), "faltando {path}");
        }

        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("SalesPage"));
        assert!(schemas.contains_key("FilterOptions"));
    }
}
