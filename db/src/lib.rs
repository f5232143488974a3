//! Persistence for the dashboard: operator sessions and dashboard settings.

pub mod models;
pub mod password;
pub mod storage;
