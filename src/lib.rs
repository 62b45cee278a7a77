pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod models;
pub mod upstream;
