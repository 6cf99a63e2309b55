use folio_core::{Action, PermissionCodec, ResourceKind};

use crate::error::DirectoryError;
use crate::store::DirectoryStore;

/// Kinds that make up the document archive itself, as opposed to
/// account and system administration.
const CONTENT_KINDS: &[ResourceKind] = &[
    ResourceKind::Document,
    ResourceKind::Tag,
    ResourceKind::Correspondent,
    ResourceKind::DocumentType,
    ResourceKind::StoragePath,
    ResourceKind::SavedView,
    ResourceKind::Note,
];

const VIEWER_ACTIONS: &[Action] = &[Action::View];
const EDITOR_ACTIONS: &[Action] = &[Action::Add, Action::View, Action::Change];

fn describe(action: Action, kind: &ResourceKind) -> String {
    format!("Can {} {}", action, kind.name().replace('_', " "))
}

fn content_codes(
    codec: &PermissionCodec,
    actions: &[Action],
) -> Result<Vec<String>, DirectoryError> {
    let mut codes = Vec::new();
    for kind in CONTENT_KINDS {
        for action in actions {
            codes.push(codec.encode(*action, kind)?);
        }
    }
    Ok(codes)
}

/// Register every code the codec knows and create the system groups.
/// Safe to run repeatedly.
pub async fn seed_defaults(
    store: &dyn DirectoryStore,
    codec: &PermissionCodec,
) -> Result<(), DirectoryError> {
    for kind in codec.kinds() {
        for action in Action::ALL {
            let code = codec.encode(action, kind)?;
            store.register_permission(&code, &describe(action, kind)).await?;
        }
    }

    let groups = [
        (
            "viewers",
            "Read-only access to documents and their metadata",
            content_codes(codec, VIEWER_ACTIONS)?,
        ),
        (
            "editors",
            "Create and edit documents and their metadata",
            content_codes(codec, EDITOR_ACTIONS)?,
        ),
        (
            "administrators",
            "Every permission on every resource kind",
            codec.all_codes(),
        ),
    ];

    for (name, description, codes) in &groups {
        let group = match store.get_group_by_name(name).await {
            Ok(g) => g,
            Err(DirectoryError::NotFound(_)) => store.create_group(name, description, true).await?,
            Err(e) => return Err(e),
        };
        for code in codes {
            store.grant_group_permission(group.id, code).await?;
        }
    }

    tracing::info!(
        kinds = codec.kinds().len(),
        groups = groups.len(),
        "directory defaults seeded"
    );
    Ok(())
}
