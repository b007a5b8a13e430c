pub mod filter;
pub mod sales;
