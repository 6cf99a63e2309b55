use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use folio_core::{GroupId, PermissionCodec, UserId};
use rusqlite::{Connection, Row};

use super::DirectoryStore;
use crate::error::DirectoryError;
use crate::types::*;

/// SQLite `extended_code` for a UNIQUE constraint violation.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

pub struct SqliteDirectoryStore {
    conn: Mutex<Connection>,
}

impl SqliteDirectoryStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &str) -> Result<Self, DirectoryError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> Result<Self, DirectoryError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self::new(conn))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DirectoryError> {
        self.conn
            .lock()
            .map_err(|_| DirectoryError::Internal("directory connection lock poisoned".into()))
    }
}

const MIGRATE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS dir_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_superuser INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS dir_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    is_system INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS dir_permissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    codename TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS dir_group_permissions (
    group_id INTEGER NOT NULL REFERENCES dir_groups(id) ON DELETE CASCADE,
    permission_id INTEGER NOT NULL REFERENCES dir_permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (group_id, permission_id)
);

CREATE TABLE IF NOT EXISTS dir_user_permissions (
    user_id INTEGER NOT NULL REFERENCES dir_users(id) ON DELETE CASCADE,
    permission_id INTEGER NOT NULL REFERENCES dir_permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, permission_id)
);

CREATE TABLE IF NOT EXISTS dir_user_groups (
    user_id INTEGER NOT NULL REFERENCES dir_users(id) ON DELETE CASCADE,
    group_id INTEGER NOT NULL REFERENCES dir_groups(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, group_id)
);
"#;

const USER_COLUMNS: &str = "id, username, email, is_active, is_superuser, created_at";
const GROUP_COLUMNS: &str = "id, name, description, is_system, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        is_superuser: row.get::<_, i32>(4)? != 0,
        created_at: row.get(5)?,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_system: row.get::<_, i32>(3)? != 0,
        created_at: row.get(4)?,
    })
}

fn not_found(what: &str) -> impl FnOnce(rusqlite::Error) -> DirectoryError + '_ {
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => DirectoryError::NotFound(format!("{what} not found")),
        _ => DirectoryError::Database(e.to_string()),
    }
}

fn duplicate(message: String) -> impl FnOnce(rusqlite::Error) -> DirectoryError {
    move |e| {
        if let rusqlite::Error::SqliteFailure(ref err, _) = e {
            if err.extended_code == SQLITE_CONSTRAINT_UNIQUE {
                return DirectoryError::Duplicate(message);
            }
        }
        DirectoryError::Database(e.to_string())
    }
}

fn user_by_id(conn: &Connection, id: UserId) -> Result<User, DirectoryError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM dir_users WHERE id = ?1"),
        [id],
        user_from_row,
    )
    .map_err(not_found("user"))
}

fn group_by_id(conn: &Connection, id: GroupId) -> Result<Group, DirectoryError> {
    conn.query_row(
        &format!("SELECT {GROUP_COLUMNS} FROM dir_groups WHERE id = ?1"),
        [id],
        group_from_row,
    )
    .map_err(not_found("group"))
}

fn permission_id(conn: &Connection, codename: &str) -> Result<i64, DirectoryError> {
    conn.query_row(
        "SELECT id FROM dir_permissions WHERE codename = ?1",
        [codename],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DirectoryError::NotFound(format!("permission '{codename}' is not registered"))
        }
        _ => DirectoryError::Database(e.to_string()),
    })
}

#[async_trait]
impl DirectoryStore for SqliteDirectoryStore {
    async fn migrate(&self) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        conn.execute_batch(MIGRATE_SQL)?;
        Ok(())
    }

    async fn seed_defaults(&self, codec: &PermissionCodec) -> Result<(), DirectoryError> {
        super::seed::seed_defaults(self, codec).await
    }

    // --- Users ---

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        is_superuser: bool,
    ) -> Result<User, DirectoryError> {
        if username.trim().is_empty() {
            return Err(DirectoryError::InvalidInput("username required".into()));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO dir_users (username, email, password_hash, is_superuser) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![username, email, password_hash, is_superuser as i32],
        )
        .map_err(duplicate(format!("user '{username}' already exists")))?;
        user_by_id(&conn, conn.last_insert_rowid())
    }

    async fn get_user(&self, id: UserId) -> Result<User, DirectoryError> {
        let conn = self.conn()?;
        user_by_id(&conn, id)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, DirectoryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM dir_users WHERE username = ?1"),
            [username],
            user_from_row,
        )
        .map_err(not_found("user"))
    }

    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM dir_users ORDER BY username"
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn set_user_active(&self, id: UserId, is_active: bool) -> Result<User, DirectoryError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE dir_users SET is_active = ?1 WHERE id = ?2",
            rusqlite::params![is_active as i32, id],
        )?;
        if changed == 0 {
            return Err(DirectoryError::NotFound("user not found".into()));
        }
        user_by_id(&conn, id)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM dir_users WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DirectoryError::NotFound("user not found".into()));
        }
        Ok(())
    }

    async fn get_password_hash(&self, user_id: UserId) -> Result<String, DirectoryError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT password_hash FROM dir_users WHERE id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .map_err(not_found("user"))
    }

    // --- Groups ---

    async fn create_group(
        &self,
        name: &str,
        description: &str,
        is_system: bool,
    ) -> Result<Group, DirectoryError> {
        if name.trim().is_empty() {
            return Err(DirectoryError::InvalidInput("group name required".into()));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO dir_groups (name, description, is_system) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, description, is_system as i32],
        )
        .map_err(duplicate(format!("group '{name}' already exists")))?;
        group_by_id(&conn, conn.last_insert_rowid())
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Group, DirectoryError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {GROUP_COLUMNS} FROM dir_groups WHERE name = ?1"),
            [name],
            group_from_row,
        )
        .map_err(not_found("group"))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {GROUP_COLUMNS} FROM dir_groups ORDER BY name"
        ))?;
        let groups = stmt
            .query_map([], group_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    async fn delete_group(&self, id: GroupId) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        let group = group_by_id(&conn, id)?;
        if group.is_system {
            return Err(DirectoryError::Forbidden(format!(
                "cannot delete system group '{}'",
                group.name
            )));
        }
        conn.execute("DELETE FROM dir_groups WHERE id = ?1", [id])?;
        Ok(())
    }

    // --- User-Group ---

    async fn add_user_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        user_by_id(&conn, user_id)?;
        group_by_id(&conn, group_id)?;
        conn.execute(
            "INSERT OR IGNORE INTO dir_user_groups (user_id, group_id) VALUES (?1, ?2)",
            [user_id, group_id],
        )?;
        Ok(())
    }

    async fn remove_user_group(
        &self,
        user_id: UserId,
        group_id: GroupId,
    ) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM dir_user_groups WHERE user_id = ?1 AND group_id = ?2",
            [user_id, group_id],
        )?;
        Ok(())
    }

    async fn list_user_groups(&self, user_id: UserId) -> Result<Vec<Group>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT g.id, g.name, g.description, g.is_system, g.created_at
             FROM dir_groups g
             JOIN dir_user_groups ug ON ug.group_id = g.id
             WHERE ug.user_id = ?1
             ORDER BY g.name",
        )?;
        let groups = stmt
            .query_map([user_id], group_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    // --- Permissions ---

    async fn register_permission(
        &self,
        codename: &str,
        description: &str,
    ) -> Result<Permission, DirectoryError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO dir_permissions (codename, description) VALUES (?1, ?2)",
            rusqlite::params![codename, description],
        )?;
        conn.query_row(
            "SELECT id, codename, description, created_at FROM dir_permissions WHERE codename = ?1",
            [codename],
            |row| {
                Ok(Permission {
                    id: row.get(0)?,
                    codename: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .map_err(|e| DirectoryError::Database(e.to_string()))
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, codename, description, created_at FROM dir_permissions ORDER BY codename",
        )?;
        let perms = stmt
            .query_map([], |row| {
                Ok(Permission {
                    id: row.get(0)?,
                    codename: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(perms)
    }

    async fn grant_group_permission(
        &self,
        group_id: GroupId,
        codename: &str,
    ) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        group_by_id(&conn, group_id)?;
        let permission_id = permission_id(&conn, codename)?;
        conn.execute(
            "INSERT OR IGNORE INTO dir_group_permissions (group_id, permission_id) VALUES (?1, ?2)",
            [group_id, permission_id],
        )?;
        Ok(())
    }

    async fn revoke_group_permission(
        &self,
        group_id: GroupId,
        codename: &str,
    ) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        let permission_id = permission_id(&conn, codename)?;
        conn.execute(
            "DELETE FROM dir_group_permissions WHERE group_id = ?1 AND permission_id = ?2",
            [group_id, permission_id],
        )?;
        Ok(())
    }

    async fn list_group_permissions(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<String>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT p.codename
             FROM dir_permissions p
             JOIN dir_group_permissions gp ON gp.permission_id = p.id
             WHERE gp.group_id = ?1
             ORDER BY p.codename",
        )?;
        let perms = stmt
            .query_map([group_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(perms)
    }

    async fn grant_user_permission(
        &self,
        user_id: UserId,
        codename: &str,
    ) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        user_by_id(&conn, user_id)?;
        let permission_id = permission_id(&conn, codename)?;
        conn.execute(
            "INSERT OR IGNORE INTO dir_user_permissions (user_id, permission_id) VALUES (?1, ?2)",
            [user_id, permission_id],
        )?;
        Ok(())
    }

    async fn revoke_user_permission(
        &self,
        user_id: UserId,
        codename: &str,
    ) -> Result<(), DirectoryError> {
        let conn = self.conn()?;
        let permission_id = permission_id(&conn, codename)?;
        conn.execute(
            "DELETE FROM dir_user_permissions WHERE user_id = ?1 AND permission_id = ?2",
            [user_id, permission_id],
        )?;
        Ok(())
    }

    async fn get_user_permissions(&self, user_id: UserId) -> Result<Vec<String>, DirectoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT p.codename AS codename
             FROM dir_permissions p
             JOIN dir_group_permissions gp ON gp.permission_id = p.id
             JOIN dir_user_groups ug ON ug.group_id = gp.group_id
             WHERE ug.user_id = ?1
             UNION
             SELECT p.codename AS codename
             FROM dir_permissions p
             JOIN dir_user_permissions up ON up.permission_id = p.id
             WHERE up.user_id = ?1
             ORDER BY codename",
        )?;
        let perms = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(perms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteDirectoryStore {
        let store = SqliteDirectoryStore::open_in_memory().unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_and_fetch_user() {
        let store = store().await;
        let user = store
            .create_user("alice", "hash", Some("alice@example.com"), false)
            .await
            .unwrap();
        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert_eq!(store.get_user(user.id).await.unwrap(), user);
        assert_eq!(store.get_user_by_username("alice").await.unwrap().id, user.id);
        assert_eq!(store.get_password_hash(user.id).await.unwrap(), "hash");
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let store = store().await;
        store.create_user("alice", "h", None, false).await.unwrap();
        assert!(matches!(
            store.create_user("alice", "h", None, false).await,
            Err(DirectoryError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let store = store().await;
        assert!(matches!(
            store.get_user(404).await,
            Err(DirectoryError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_user(404).await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deactivate_user() {
        let store = store().await;
        let user = store.create_user("bob", "h", None, false).await.unwrap();
        let user = store.set_user_active(user.id, false).await.unwrap();
        assert!(!user.is_active);
    }

    #[tokio::test]
    async fn effective_permissions_merge_groups_and_direct_grants() {
        let store = store().await;
        for code in ["view_document", "change_document", "add_tag"] {
            store.register_permission(code, "").await.unwrap();
        }
        let user = store.create_user("carol", "h", None, false).await.unwrap();
        let readers = store.create_group("readers", "", false).await.unwrap();
        let writers = store.create_group("writers", "", false).await.unwrap();
        store
            .grant_group_permission(readers.id, "view_document")
            .await
            .unwrap();
        store
            .grant_group_permission(writers.id, "view_document")
            .await
            .unwrap();
        store
            .grant_group_permission(writers.id, "change_document")
            .await
            .unwrap();
        store.grant_user_permission(user.id, "add_tag").await.unwrap();
        store.add_user_group(user.id, readers.id).await.unwrap();
        store.add_user_group(user.id, writers.id).await.unwrap();

        assert_eq!(
            store.get_user_permissions(user.id).await.unwrap(),
            vec!["add_tag", "change_document", "view_document"]
        );

        store.remove_user_group(user.id, writers.id).await.unwrap();
        store.revoke_user_permission(user.id, "add_tag").await.unwrap();
        assert_eq!(
            store.get_user_permissions(user.id).await.unwrap(),
            vec!["view_document"]
        );
    }

    #[tokio::test]
    async fn granting_unregistered_code_fails() {
        let store = store().await;
        let group = store.create_group("g", "", false).await.unwrap();
        assert!(matches!(
            store.grant_group_permission(group.id, "view_nothing").await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn register_permission_is_idempotent() {
        let store = store().await;
        let first = store.register_permission("view_tag", "Can view tag").await.unwrap();
        let second = store.register_permission("view_tag", "other").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_permissions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn system_groups_cannot_be_deleted() {
        let store = store().await;
        let system = store.create_group("admins", "", true).await.unwrap();
        let custom = store.create_group("temp", "", false).await.unwrap();
        assert!(matches!(
            store.delete_group(system.id).await,
            Err(DirectoryError::Forbidden(_))
        ));
        store.delete_group(custom.id).await.unwrap();
        assert_eq!(store.list_groups().await.unwrap(), vec![system]);
    }

    #[tokio::test]
    async fn membership_requires_existing_rows() {
        let store = store().await;
        let user = store.create_user("dan", "h", None, false).await.unwrap();
        assert!(matches!(
            store.add_user_group(user.id, 77).await,
            Err(DirectoryError::NotFound(_))
        ));
    }
}
