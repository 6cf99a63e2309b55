use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{FolioError, Result};
use crate::types::{ManagedObject, ResourceKind};

/// Create/update collaborator for one resource kind.
#[async_trait]
pub trait CrudService: Send + Sync {
    /// The kind of resource this service manages.
    fn kind(&self) -> &ResourceKind;

    async fn get(&self, id: i64) -> Result<ManagedObject>;

    async fn list(&self) -> Result<Vec<ManagedObject>>;

    /// Persist a new object. The returned object carries its assigned id.
    async fn create(&self, object: ManagedObject) -> Result<ManagedObject>;

    async fn update(&self, object: ManagedObject) -> Result<ManagedObject>;
}

/// In-process [`CrudService`] keeping objects in a map.
///
/// Mirrors the backend's handling of the write-side ACL: a `set_permissions`
/// payload replaces the stored `permissions`.
pub struct MemoryCrudService {
    kind: ResourceKind,
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    objects: BTreeMap<i64, ManagedObject>,
    last_id: i64,
}

impl MemoryCrudService {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn apply_acl(mut object: ManagedObject) -> ManagedObject {
        if let Some(acl) = object.set_permissions.take() {
            object.permissions = Some(acl);
        }
        object
    }
}

#[async_trait]
impl CrudService for MemoryCrudService {
    fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    async fn get(&self, id: i64) -> Result<ManagedObject> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .objects
            .get(&id)
            .cloned()
            .ok_or_else(|| FolioError::NotFound(format!("{} {id}", self.kind)))
    }

    async fn list(&self) -> Result<Vec<ManagedObject>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.objects.values().cloned().collect())
    }

    async fn create(&self, object: ManagedObject) -> Result<ManagedObject> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.last_id += 1;
        let id = state.last_id;
        let mut object = Self::apply_acl(object);
        object.id = Some(id);
        state.objects.insert(id, object.clone());
        Ok(object)
    }

    async fn update(&self, object: ManagedObject) -> Result<ManagedObject> {
        let id = object
            .id
            .ok_or_else(|| FolioError::Crud(format!("cannot update {} without an id", self.kind)))?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.objects.contains_key(&id) {
            return Err(FolioError::NotFound(format!("{} {id}", self.kind)));
        }
        let object = Self::apply_acl(object);
        state.objects.insert(id, object.clone());
        Ok(object)
    }
}
