//! Everything that talks to phoenixd: the HTTP client, the WebSocket event
//! stream, and the manager that owns the active connection.

pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod manager;

pub use client::PhoenixdClient;
pub use connection::PhoenixdConnection;
pub use error::PhoenixdError;
pub use events::EventStream;
pub use manager::PhoenixdManager;
