pub mod codec;
pub mod config;
pub mod crud;
pub mod edit;
pub mod error;
pub mod registry;
pub mod types;

pub use codec::PermissionCodec;
pub use crud::{CrudService, MemoryCrudService};
pub use edit::{DialogMode, EditDialog, PermissionsForm};
pub use error::{FolioError, PermissionError, Result};
pub use registry::{PermissionRegistry, Session};
pub use types::*;
