use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::crud::CrudService;
use crate::error::{FolioError, Result};
use crate::registry::PermissionRegistry;
use crate::types::{Action, Actor, ManagedObject, ObjectPermissions, ResourceKind, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogMode {
    Create,
    Edit,
}

impl fmt::Display for DialogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogMode::Create => f.write_str("create"),
            DialogMode::Edit => f.write_str("edit"),
        }
    }
}

impl FromStr for DialogMode {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(DialogMode::Create),
            "edit" => Ok(DialogMode::Edit),
            other => Err(FolioError::InvalidDialogMode(other.to_string())),
        }
    }
}

/// The ownership/rights sub-form shown alongside the resource fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsForm {
    pub owner: Option<UserId>,
    pub set_permissions: Option<ObjectPermissions>,
}

/// Create/edit workflow over one [`CrudService`].
pub struct EditDialog<'a> {
    service: &'a dyn CrudService,
    mode: DialogMode,
    object: ManagedObject,
    pub fields: Map<String, Value>,
    pub permissions_form: PermissionsForm,
}

impl<'a> EditDialog<'a> {
    /// New object; the current actor is proposed as owner.
    pub fn create(service: &'a dyn CrudService, actor: &Actor) -> Self {
        Self {
            service,
            mode: DialogMode::Create,
            object: ManagedObject::default(),
            fields: Map::new(),
            permissions_form: PermissionsForm {
                owner: Some(actor.id),
                set_permissions: None,
            },
        }
    }

    /// Existing object; the form is seeded from its fields and ACL.
    pub fn edit(service: &'a dyn CrudService, object: ManagedObject) -> Self {
        Self {
            service,
            mode: DialogMode::Edit,
            fields: object.fields.clone(),
            permissions_form: PermissionsForm {
                owner: object.owner,
                set_permissions: object.permissions.clone(),
            },
            object,
        }
    }

    pub fn open(
        service: &'a dyn CrudService,
        mode: DialogMode,
        object: Option<ManagedObject>,
        actor: &Actor,
    ) -> Result<Self> {
        match (mode, object) {
            (DialogMode::Create, _) => Ok(Self::create(service, actor)),
            (DialogMode::Edit, Some(object)) => Ok(Self::edit(service, object)),
            (DialogMode::Edit, None) => Err(FolioError::NotFound(format!(
                "no {} given to edit",
                service.kind()
            ))),
        }
    }

    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn object(&self) -> &ManagedObject {
        &self.object
    }

    pub fn set_field(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Merge the form over the original object and flatten the permissions
    /// sub-form into `owner` / `set_permissions`.
    ///
    /// Only owners may reassign ownership or rights; for anyone else the
    /// sub-form is dropped and the stored owner is kept.
    pub fn payload(&self, actor_owns: bool) -> ManagedObject {
        let mut payload = self.object.clone();
        payload.set_permissions = None;
        for (key, value) in &self.fields {
            payload.fields.insert(key.clone(), value.clone());
        }
        if actor_owns {
            payload.owner = self.permissions_form.owner;
            payload.set_permissions = self.permissions_form.set_permissions.clone();
        }
        payload
    }

    /// Check the actor's rights, then hand the payload to the CRUD service.
    pub async fn save(&self, registry: &PermissionRegistry) -> Result<ManagedObject> {
        let kind = self.service.kind();
        match self.mode {
            DialogMode::Create => {
                if !registry.can(Action::Add, kind)? {
                    return Err(forbidden(registry, Action::Add, kind)?);
                }
                let payload = self.payload(true);
                tracing::debug!(kind = %kind, "creating object");
                self.service.create(payload).await
            }
            DialogMode::Edit => {
                if !registry.can(Action::Change, kind)?
                    || !registry.has_object_permission(Action::Change, &self.object)?
                {
                    return Err(forbidden(registry, Action::Change, kind)?);
                }
                let payload = self.payload(registry.owns_object(&self.object)?);
                tracing::debug!(kind = %kind, id = ?self.object.id, "updating object");
                self.service.update(payload).await
            }
        }
    }
}

fn forbidden(
    registry: &PermissionRegistry,
    action: Action,
    kind: &ResourceKind,
) -> Result<FolioError> {
    let code = registry.codec().encode(action, kind)?;
    Ok(FolioError::Forbidden(format!("missing permission: {code}")))
}
