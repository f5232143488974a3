pub mod session;
pub mod session_id;
pub mod settings;

pub use session::*;
pub use session_id::*;
pub use settings::*;
