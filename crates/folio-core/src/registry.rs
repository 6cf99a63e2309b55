use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::codec::PermissionCodec;
use crate::error::PermissionError;
use crate::types::{Action, Actor, AuthorizableObject, ResourceKind};

/// Immutable per-session state: who is acting and which codes they hold.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: Actor,
    pub grants: HashSet<String>,
}

/// Answers permission questions for one session.
///
/// Constructed once and passed by reference; several registries can live
/// side by side. The snapshot is swapped as a whole by [`initialize`] and
/// never mutated in place, so readers only hold the lock while cloning
/// the `Arc`.
///
/// [`initialize`]: PermissionRegistry::initialize
#[derive(Debug)]
pub struct PermissionRegistry {
    codec: Arc<PermissionCodec>,
    session: RwLock<Option<Arc<Session>>>,
}

impl PermissionRegistry {
    pub fn new(codec: Arc<PermissionCodec>) -> Self {
        Self {
            codec,
            session: RwLock::new(None),
        }
    }

    pub fn codec(&self) -> &PermissionCodec {
        &self.codec
    }

    /// Replace the actor and grant set. Called at login and on refresh.
    pub fn initialize(&self, grants: impl IntoIterator<Item = String>, actor: Actor) {
        let session = Arc::new(Session {
            grants: grants.into_iter().collect(),
            actor,
        });
        tracing::debug!(
            user = %session.actor.username,
            grants = session.grants.len(),
            "permission session initialized"
        );
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
    }

    /// Drop the current session (logout).
    pub fn clear(&self) {
        let previous = self
            .session
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(session) = previous {
            tracing::debug!(user = %session.actor.username, "permission session cleared");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn session(&self) -> Result<Arc<Session>, PermissionError> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(PermissionError::NotInitialized)
    }

    pub fn actor(&self) -> Result<Actor, PermissionError> {
        Ok(self.session()?.actor.clone())
    }

    /// Coarse-grained check against the grant set. Superusers get no
    /// special treatment here; their grant set already lists every code.
    pub fn can(&self, action: Action, kind: &ResourceKind) -> Result<bool, PermissionError> {
        let session = self.session()?;
        let code = self.codec.encode(action, kind)?;
        Ok(session.grants.contains(&code))
    }

    /// Membership test for a raw code. The code must be one the codec knows.
    pub fn can_code(&self, code: &str) -> Result<bool, PermissionError> {
        let session = self.session()?;
        self.codec.decode(code)?;
        Ok(session.grants.contains(code))
    }

    /// Actions the actor holds on `kind`, in [`Action::ALL`] order.
    pub fn permitted_actions(&self, kind: &ResourceKind) -> Result<Vec<Action>, PermissionError> {
        let session = self.session()?;
        let mut actions = Vec::new();
        for action in Action::ALL {
            if session.grants.contains(&self.codec.encode(action, kind)?) {
                actions.push(action);
            }
        }
        Ok(actions)
    }

    pub fn owns_object<O>(&self, object: &O) -> Result<bool, PermissionError>
    where
        O: AuthorizableObject + ?Sized,
    {
        let session = self.session()?;
        Ok(owns(&session.actor, object))
    }

    /// Object-level check. Only `View` and `Change` exist at this level.
    pub fn has_object_permission<O>(
        &self,
        action: Action,
        object: &O,
    ) -> Result<bool, PermissionError>
    where
        O: AuthorizableObject + ?Sized,
    {
        let session = self.session()?;
        let actor = &session.actor;
        let acl = object.permissions();

        let allowed = match action {
            Action::View => owns(actor, object) || acl.is_some_and(|p| p.view.admits(actor)),
            Action::Change => {
                owns(actor, object)
                    || object.user_can_change()
                    || acl.is_some_and(|p| p.change.admits(actor))
            }
            Action::Add | Action::Delete => {
                return Err(PermissionError::UnsupportedAction(action));
            }
        };
        Ok(allowed)
    }
}

fn owns<O>(actor: &Actor, object: &O) -> bool
where
    O: AuthorizableObject + ?Sized,
{
    match object.owner() {
        None => true,
        Some(owner) => actor.is_superuser || owner == actor.id,
    }
}
