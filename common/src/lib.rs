//! Types shared between the dashboard API server, its storage layer and the
//! operator CLI.

pub mod caller;
pub mod params;
pub mod views;
