use anyhow::Result;
use std::path::Path;

use folio_core::PermissionRegistry;

use super::Context;

pub async fn run(base_dir: &Path, username: &str, password: &Option<String>) -> Result<()> {
    let ctx = Context::open(base_dir).await?;
    let password = crate::get_password(password)?;

    let registry = PermissionRegistry::new(ctx.codec.clone());
    let actor = folio_auth::login(&ctx.store, &registry, username, &password).await?;
    let session = registry.session()?;

    println!("Logged in as {} (id={})", actor.username, actor.id);
    println!("  Superuser: {}", actor.is_superuser);
    println!(
        "  Groups:    {}",
        actor
            .groups
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Grants:    {}", session.grants.len());

    for kind in ctx.codec.kinds() {
        let actions = registry.permitted_actions(kind)?;
        if !actions.is_empty() {
            let verbs: Vec<&str> = actions.iter().map(|a| a.verb()).collect();
            println!("    {:<16} {}", kind.name(), verbs.join(", "));
        }
    }

    Ok(())
}
