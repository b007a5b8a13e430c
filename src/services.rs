pub mod import_service;
pub mod sales_query;
pub mod sales_service;
