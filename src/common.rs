pub mod error;
pub mod query_parser;
