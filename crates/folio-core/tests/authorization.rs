/// End-to-end checks of the permission model against objects in the
/// backend's JSON shape.
use std::sync::Arc;

use folio_core::{
    Action, Actor, ManagedObject, PermissionCodec, PermissionError, PermissionRegistry,
    ResourceKind,
};

fn object(json: serde_json::Value) -> ManagedObject {
    serde_json::from_value(json).unwrap()
}

fn registry_for(actor: Actor, grants: &[&str]) -> PermissionRegistry {
    let registry = PermissionRegistry::new(Arc::new(PermissionCodec::builtin().unwrap()));
    registry.initialize(grants.iter().map(|g| g.to_string()), actor);
    registry
}

#[test]
fn group_member_can_view_foreign_object() {
    let registry = registry_for(Actor::new(7, "dana").with_groups([3]), &["view_document"]);
    let doc = object(serde_json::json!({
        "id": 100,
        "title": "Lease",
        "owner": 9,
        "permissions": {
            "view": { "users": [], "groups": [3] },
            "change": { "users": [], "groups": [] }
        }
    }));

    assert!(registry.can(Action::View, &ResourceKind::Document).unwrap());
    assert!(registry.has_object_permission(Action::View, &doc).unwrap());
    assert!(!registry.owns_object(&doc).unwrap());
    assert!(!registry.has_object_permission(Action::Change, &doc).unwrap());
}

#[test]
fn removing_user_from_acl_revokes_view() {
    let registry = registry_for(Actor::new(7, "dana").with_groups([3]), &[]);
    let shared = object(serde_json::json!({
        "owner": 9,
        "permissions": { "view": { "users": [7], "groups": [5] } }
    }));
    let unshared = object(serde_json::json!({
        "owner": 9,
        "permissions": { "view": { "users": [], "groups": [5] } }
    }));
    assert!(registry.has_object_permission(Action::View, &shared).unwrap());
    assert!(!registry.has_object_permission(Action::View, &unshared).unwrap());
}

#[test]
fn server_hint_grants_change() {
    let registry = registry_for(Actor::new(7, "dana"), &[]);
    let doc = object(serde_json::json!({ "owner": 9, "user_can_change": true }));
    assert!(registry.has_object_permission(Action::Change, &doc).unwrap());
}

#[test]
fn superuser_owns_any_object_for_any_owner() {
    let registry = registry_for(Actor::new(1, "root").superuser(), &[]);
    for owner in [1, 2, 99] {
        assert!(registry.owns_object(&ManagedObject::owned_by(owner)).unwrap());
    }
}

#[test]
fn logout_makes_checks_fail() {
    let registry = registry_for(Actor::new(7, "dana"), &["view_tag"]);
    registry.clear();
    assert_eq!(
        registry.can(Action::View, &ResourceKind::Tag),
        Err(PermissionError::NotInitialized)
    );
    assert_eq!(
        registry.owns_object(&ManagedObject::default()),
        Err(PermissionError::NotInitialized)
    );
}
