pub mod api;
pub mod config;
pub mod core;
pub mod rates;
pub mod summary;
