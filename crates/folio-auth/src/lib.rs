pub mod error;
pub mod password;
pub mod session;
pub mod store;
pub mod types;

pub use error::DirectoryError;
pub use password::{hash_password, verify_password};
pub use session::{SessionData, load_session, login, logout, refresh};
pub use store::{DirectoryStore, SqliteDirectoryStore};
pub use types::*;
