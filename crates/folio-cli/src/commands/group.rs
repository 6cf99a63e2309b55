use anyhow::Result;
use std::path::Path;

use folio_auth::DirectoryStore;

use super::Context;
use crate::GroupCommand;

pub async fn run(base_dir: &Path, cmd: GroupCommand) -> Result<()> {
    let ctx = Context::open(base_dir).await?;
    let store = &ctx.store;

    match cmd {
        GroupCommand::Add { name, description } => {
            let group = store
                .create_group(&name, description.as_deref().unwrap_or(""), false)
                .await?;
            println!("Created group '{}' (id={})", group.name, group.id);
        }
        GroupCommand::List => {
            let groups = store.list_groups().await?;
            if groups.is_empty() {
                println!("No groups found. Run `folio init` to seed the defaults.");
                return Ok(());
            }
            for g in &groups {
                let codes = store.list_group_permissions(g.id).await?;
                println!(
                    "{} (id={}{}): {}",
                    g.name,
                    g.id,
                    if g.is_system { ", system" } else { "" },
                    g.description
                );
                println!("    {} codes: {}", codes.len(), codes.join(", "));
            }
        }
        GroupCommand::Grant { group, code } => {
            ctx.codec.decode(&code)?;
            let group = store.get_group_by_name(&group).await?;
            store.grant_group_permission(group.id, &code).await?;
            println!("Granted {code} to group '{}'", group.name);
        }
        GroupCommand::Revoke { group, code } => {
            let group = store.get_group_by_name(&group).await?;
            store.revoke_group_permission(group.id, &code).await?;
            println!("Revoked {code} from group '{}'", group.name);
        }
        GroupCommand::Delete { name } => {
            let group = store.get_group_by_name(&name).await?;
            store.delete_group(group.id).await?;
            println!("Deleted group '{}'", group.name);
        }
    }

    Ok(())
}
