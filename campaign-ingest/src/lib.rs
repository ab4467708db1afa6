pub mod api;
pub mod clients;
pub mod config;
pub mod correlation;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod models;
