pub mod seed;
pub mod sqlite;

pub use sqlite::SqliteDirectoryStore;

use async_trait::async_trait;
use folio_core::{GroupId, PermissionCodec, UserId};

use crate::error::DirectoryError;
use crate::types::*;

/// User/group directory and permission-grant source.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    // Users
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        is_superuser: bool,
    ) -> Result<User, DirectoryError>;
    async fn get_user(&self, id: UserId) -> Result<User, DirectoryError>;
    async fn get_user_by_username(&self, username: &str) -> Result<User, DirectoryError>;
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError>;
    async fn set_user_active(&self, id: UserId, is_active: bool) -> Result<User, DirectoryError>;
    async fn delete_user(&self, id: UserId) -> Result<(), DirectoryError>;
    async fn get_password_hash(&self, user_id: UserId) -> Result<String, DirectoryError>;

    // Groups
    async fn create_group(
        &self,
        name: &str,
        description: &str,
        is_system: bool,
    ) -> Result<Group, DirectoryError>;
    async fn get_group_by_name(&self, name: &str) -> Result<Group, DirectoryError>;
    async fn list_groups(&self) -> Result<Vec<Group>, DirectoryError>;
    async fn delete_group(&self, id: GroupId) -> Result<(), DirectoryError>;

    // User-Group
    async fn add_user_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), DirectoryError>;
    async fn remove_user_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), DirectoryError>;
    async fn list_user_groups(&self, user_id: UserId) -> Result<Vec<Group>, DirectoryError>;

    // Permissions
    /// Idempotent: returns the existing row when the code is already known.
    async fn register_permission(
        &self,
        codename: &str,
        description: &str,
    ) -> Result<Permission, DirectoryError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, DirectoryError>;
    async fn grant_group_permission(
        &self,
        group_id: GroupId,
        codename: &str,
    ) -> Result<(), DirectoryError>;
    async fn revoke_group_permission(
        &self,
        group_id: GroupId,
        codename: &str,
    ) -> Result<(), DirectoryError>;
    async fn list_group_permissions(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<String>, DirectoryError>;
    async fn grant_user_permission(
        &self,
        user_id: UserId,
        codename: &str,
    ) -> Result<(), DirectoryError>;
    async fn revoke_user_permission(
        &self,
        user_id: UserId,
        codename: &str,
    ) -> Result<(), DirectoryError>;
    /// Direct grants plus everything inherited through groups, sorted.
    async fn get_user_permissions(&self, user_id: UserId) -> Result<Vec<String>, DirectoryError>;

    // Lifecycle
    async fn migrate(&self) -> Result<(), DirectoryError>;
    async fn seed_defaults(&self, codec: &PermissionCodec) -> Result<(), DirectoryError>;
}
