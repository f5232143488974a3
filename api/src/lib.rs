//! phoenixd dashboard API service.
//!
//! Fronts a phoenixd Lightning node with a REST API, relays its payment
//! events over a WebSocket and guards both with an optional dashboard
//! password.
//!
//! # Configuration
//!
//! See [`config::PdashApiConfig`]. The local phoenixd is either reached at a
//! configured URL or launched and supervised by [`launcher::LocalPhoenixd`].
//!
//! # Authentication
//!
//! Without a password every endpoint is open. Once one is set, callers hold a
//! signed session cookie and send a CSRF token on mutating requests. See
//! [`auth::signing`] and [`auth::providers::session`].

pub mod auth;
pub mod config;
pub mod context;
pub mod launcher;
pub mod phoenixd;
pub mod server;

pub(crate) mod error;
pub(crate) mod handlers;
