use anyhow::{Result, bail};
use std::path::Path;

use folio_auth::{DirectoryStore, load_session};
use folio_core::{Action, ManagedObject, PermissionRegistry, ResourceKind};

use super::Context;

fn verdict(allowed: bool) -> &'static str {
    if allowed { "allowed" } else { "denied" }
}

pub async fn run(
    base_dir: &Path,
    username: &str,
    action: &str,
    kind: &str,
    object: Option<&Path>,
) -> Result<()> {
    let ctx = Context::open(base_dir).await?;
    let action: Action = action.parse()?;
    let kind = ResourceKind::from(kind);
    if !ctx.codec.contains(&kind) {
        bail!("unknown resource kind: {kind}");
    }

    let user = ctx.store.get_user_by_username(username).await?;
    let session = load_session(&ctx.store, &ctx.codec, user.id).await?;
    let registry = PermissionRegistry::new(ctx.codec.clone());
    registry.initialize(session.grants, session.actor);

    let code = ctx.codec.encode(action, &kind)?;
    println!("{username}: {code} -> {}", verdict(registry.can(action, &kind)?));

    if let Some(path) = object {
        let object: ManagedObject = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        println!(
            "{username}: owns {} -> {}",
            path.display(),
            verdict(registry.owns_object(&object)?)
        );
        match action {
            Action::View | Action::Change => println!(
                "{username}: {action} {} -> {}",
                path.display(),
                verdict(registry.has_object_permission(action, &object)?)
            ),
            Action::Add | Action::Delete => {
                println!("{action} has no object-level rules; the coarse check above applies")
            }
        }
    }

    Ok(())
}
