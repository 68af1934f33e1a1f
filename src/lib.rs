//! School management REST backend.
//!
//! An axum application mounting CRUD handler groups behind an origin
//! admission policy, with fail-fast crash handling around the listener.

pub mod admin;
pub mod config;
pub mod cors;
pub mod crash;
pub mod db;
pub mod error;
pub mod middleware_impls;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
