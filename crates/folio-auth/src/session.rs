use std::collections::BTreeSet;

use folio_core::{Actor, PermissionCodec, PermissionRegistry, UserId};

use crate::error::DirectoryError;
use crate::password::verify_password;
use crate::store::DirectoryStore;

/// Grant set and actor snapshot for one user, as fed to
/// [`PermissionRegistry::initialize`].
#[derive(Debug, Clone)]
pub struct SessionData {
    pub grants: Vec<String>,
    pub actor: Actor,
}

/// Read a user's snapshot from the directory.
///
/// Superusers are given every code the codec knows, so coarse-grained
/// checks never need to special-case them.
pub async fn load_session(
    store: &dyn DirectoryStore,
    codec: &PermissionCodec,
    user_id: UserId,
) -> Result<SessionData, DirectoryError> {
    let user = store.get_user(user_id).await?;
    if !user.is_active {
        return Err(DirectoryError::Unauthorized);
    }

    let mut grants: BTreeSet<String> = store
        .get_user_permissions(user.id)
        .await?
        .into_iter()
        .collect();
    if user.is_superuser {
        grants.extend(codec.all_codes());
    }

    let groups = store
        .list_user_groups(user.id)
        .await?
        .into_iter()
        .map(|g| g.id)
        .collect();

    Ok(SessionData {
        grants: grants.into_iter().collect(),
        actor: Actor {
            id: user.id,
            username: user.username,
            is_superuser: user.is_superuser,
            groups,
        },
    })
}

/// Verify credentials and start a session on `registry`.
pub async fn login(
    store: &dyn DirectoryStore,
    registry: &PermissionRegistry,
    username: &str,
    password: &str,
) -> Result<Actor, DirectoryError> {
    let user = match store.get_user_by_username(username).await {
        Ok(user) => user,
        Err(DirectoryError::NotFound(_)) => {
            tracing::warn!(%username, "login rejected: unknown user");
            return Err(DirectoryError::Unauthorized);
        }
        Err(e) => return Err(e),
    };

    let hash = store.get_password_hash(user.id).await?;
    if !verify_password(password, &hash)? {
        tracing::warn!(%username, "login rejected: bad password");
        return Err(DirectoryError::Unauthorized);
    }

    let session = load_session(store, registry.codec(), user.id).await?;
    registry.initialize(session.grants, session.actor.clone());
    tracing::info!(%username, superuser = session.actor.is_superuser, "login succeeded");
    Ok(session.actor)
}

/// Reload the current actor's snapshot, e.g. after group changes.
pub async fn refresh(
    store: &dyn DirectoryStore,
    registry: &PermissionRegistry,
) -> Result<Actor, DirectoryError> {
    let current = registry.actor()?;
    let session = load_session(store, registry.codec(), current.id).await?;
    registry.initialize(session.grants, session.actor.clone());
    Ok(session.actor)
}

/// End the session on `registry`.
pub fn logout(registry: &PermissionRegistry) {
    registry.clear();
}
