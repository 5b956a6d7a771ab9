pub mod checkout;
pub mod config;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;
