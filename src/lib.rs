pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod model;
pub mod query;
pub mod routes;
pub mod store;
