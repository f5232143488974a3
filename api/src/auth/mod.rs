pub mod cookies;
pub mod error;
pub mod extractor;
pub mod manager;
pub mod provider;
pub mod providers;
pub mod signing;
pub mod sweeper;

pub use error::AuthError;
pub use extractor::{Auth, MaybeAuth};
pub use manager::AuthManager;
pub use provider::AuthProvider;
pub use providers::{open::OpenAccessProvider, session::SessionAuthProvider};
pub use signing::SessionSigner;
