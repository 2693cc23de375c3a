pub mod config;
pub mod conversion;
pub mod error;
pub mod models;
pub mod routes;
pub mod scratch;
pub mod session;
pub mod templates;
