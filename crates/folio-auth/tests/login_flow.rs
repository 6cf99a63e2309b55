/// Full session flow: seed a file-backed directory, log users in, and ask
/// the registry questions with the snapshot it was given.
use std::sync::Arc;

use folio_auth::{
    DirectoryError, DirectoryStore, SqliteDirectoryStore, hash_password, login, logout, refresh,
};
use folio_core::{
    Action, ManagedObject, ObjectPermissions, PermissionCodec, PermissionError,
    PermissionRegistry, ResourceKind, RuleSet,
};
use tempfile::TempDir;

async fn setup(tmp: &TempDir) -> (SqliteDirectoryStore, Arc<PermissionCodec>) {
    let path = tmp.path().join("folio.db");
    let store = SqliteDirectoryStore::open(path.to_str().unwrap()).unwrap();
    let codec = Arc::new(PermissionCodec::builtin().unwrap());
    store.migrate().await.unwrap();
    store.seed_defaults(&codec).await.unwrap();
    (store, codec)
}

#[tokio::test]
async fn editor_login_populates_registry() {
    let tmp = TempDir::new().unwrap();
    let (store, codec) = setup(&tmp).await;

    let hash = hash_password("s3cret-pass").unwrap();
    let user = store.create_user("erin", &hash, None, false).await.unwrap();
    let editors = store.get_group_by_name("editors").await.unwrap();
    store.add_user_group(user.id, editors.id).await.unwrap();

    let registry = PermissionRegistry::new(codec);
    let actor = login(&store, &registry, "erin", "s3cret-pass").await.unwrap();
    assert_eq!(actor.id, user.id);
    assert!(actor.groups.contains(&editors.id));

    assert!(registry.can(Action::Change, &ResourceKind::Document).unwrap());
    assert!(!registry.can(Action::Delete, &ResourceKind::Document).unwrap());
    assert!(!registry.can(Action::View, &ResourceKind::User).unwrap());

    let mut shared = ManagedObject::owned_by(user.id + 100);
    shared.permissions = Some(ObjectPermissions {
        view: RuleSet {
            users: Default::default(),
            groups: [editors.id].into(),
        },
        change: RuleSet::default(),
    });
    assert!(registry.has_object_permission(Action::View, &shared).unwrap());
    assert!(!registry.has_object_permission(Action::Change, &shared).unwrap());

    logout(&registry);
    assert_eq!(
        registry.can(Action::View, &ResourceKind::Document),
        Err(PermissionError::NotInitialized)
    );
}

#[tokio::test]
async fn superuser_session_holds_every_code() {
    let tmp = TempDir::new().unwrap();
    let (store, codec) = setup(&tmp).await;
    let hash = hash_password("root-password").unwrap();
    store.create_user("root", &hash, None, true).await.unwrap();

    let registry = PermissionRegistry::new(codec.clone());
    login(&store, &registry, "root", "root-password").await.unwrap();
    let session = registry.session().unwrap();
    for code in codec.all_codes() {
        assert!(session.grants.contains(&code), "missing {code}");
    }
    assert!(registry.owns_object(&ManagedObject::owned_by(12345)).unwrap());
}

#[tokio::test]
async fn bad_credentials_leave_registry_empty() {
    let tmp = TempDir::new().unwrap();
    let (store, codec) = setup(&tmp).await;
    let hash = hash_password("right-password").unwrap();
    store.create_user("frank", &hash, None, false).await.unwrap();

    let registry = PermissionRegistry::new(codec);
    assert!(matches!(
        login(&store, &registry, "frank", "wrong-password").await,
        Err(DirectoryError::Unauthorized)
    ));
    assert!(matches!(
        login(&store, &registry, "nobody", "whatever-pass").await,
        Err(DirectoryError::Unauthorized)
    ));
    assert!(!registry.is_initialized());
}

#[tokio::test]
async fn inactive_user_cannot_log_in() {
    let tmp = TempDir::new().unwrap();
    let (store, codec) = setup(&tmp).await;
    let hash = hash_password("gone-for-good").unwrap();
    let user = store.create_user("gina", &hash, None, false).await.unwrap();
    store.set_user_active(user.id, false).await.unwrap();

    let registry = PermissionRegistry::new(codec);
    assert!(matches!(
        login(&store, &registry, "gina", "gone-for-good").await,
        Err(DirectoryError::Unauthorized)
    ));
}

#[tokio::test]
async fn refresh_picks_up_new_grants() {
    let tmp = TempDir::new().unwrap();
    let (store, codec) = setup(&tmp).await;
    let hash = hash_password("hank-password").unwrap();
    let user = store.create_user("hank", &hash, None, false).await.unwrap();

    let registry = PermissionRegistry::new(codec);
    login(&store, &registry, "hank", "hank-password").await.unwrap();
    assert!(!registry.can(Action::View, &ResourceKind::Tag).unwrap());

    store.grant_user_permission(user.id, "view_tag").await.unwrap();
    refresh(&store, &registry).await.unwrap();
    assert!(registry.can(Action::View, &ResourceKind::Tag).unwrap());
}

#[tokio::test]
async fn deleted_user_loses_access() {
    let tmp = TempDir::new().unwrap();
    let (store, codec) = setup(&tmp).await;

    let hash = hash_password("s3cret-pass").unwrap();
    let user = store.create_user("dana", &hash, None, false).await.unwrap();
    let viewers = store.get_group_by_name("viewers").await.unwrap();
    store.add_user_group(user.id, viewers.id).await.unwrap();
    store
        .grant_user_permission(user.id, "add_note")
        .await
        .unwrap();

    store.delete_user(user.id).await.unwrap();

    let registry = PermissionRegistry::new(codec);
    assert!(matches!(
        login(&store, &registry, "dana", "s3cret-pass").await,
        Err(DirectoryError::Unauthorized)
    ));
    assert!(!registry.is_initialized());
    assert!(store.get_user_permissions(user.id).await.unwrap().is_empty());
    assert!(store.list_user_groups(user.id).await.unwrap().is_empty());
}
