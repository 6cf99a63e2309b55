use anyhow::Result;
use std::path::Path;

use folio_auth::{DirectoryStore, hash_password};

use super::Context;
use crate::UserCommand;

pub async fn run(base_dir: &Path, cmd: UserCommand) -> Result<()> {
    let ctx = Context::open(base_dir).await?;
    let store = &ctx.store;

    match cmd {
        UserCommand::Add {
            username,
            email,
            superuser,
            password,
        } => {
            let password = crate::get_password(&password)?;
            let hash = hash_password(&password)?;
            let user = store
                .create_user(&username, &hash, email.as_deref(), superuser)
                .await?;
            tracing::info!(user = %user.username, id = user.id, "user created");
            println!(
                "Created user '{}' (id={}{})",
                user.username,
                user.id,
                if user.is_superuser { ", superuser" } else { "" }
            );
        }
        UserCommand::List => {
            let users = store.list_users().await?;
            if users.is_empty() {
                println!("No users in {}.", ctx.config.folio.db_path);
                return Ok(());
            }
            println!(
                "{:<6} {:<20} {:<8} {:<10} {}",
                "ID", "USERNAME", "ACTIVE", "SUPERUSER", "GROUPS"
            );
            println!("{}", "-".repeat(80));
            for u in &users {
                let groups: Vec<String> = store
                    .list_user_groups(u.id)
                    .await?
                    .into_iter()
                    .map(|g| g.name)
                    .collect();
                println!(
                    "{:<6} {:<20} {:<8} {:<10} {}",
                    u.id,
                    u.username,
                    u.is_active,
                    u.is_superuser,
                    groups.join(", ")
                );
            }
        }
        UserCommand::Join { username, group } => {
            let user = store.get_user_by_username(&username).await?;
            let group = store.get_group_by_name(&group).await?;
            store.add_user_group(user.id, group.id).await?;
            println!("Added '{}' to group '{}'", user.username, group.name);
        }
        UserCommand::Leave { username, group } => {
            let user = store.get_user_by_username(&username).await?;
            let group = store.get_group_by_name(&group).await?;
            store.remove_user_group(user.id, group.id).await?;
            println!("Removed '{}' from group '{}'", user.username, group.name);
        }
        UserCommand::Grant { username, code } => {
            ctx.codec.decode(&code)?;
            let user = store.get_user_by_username(&username).await?;
            store.grant_user_permission(user.id, &code).await?;
            println!("Granted {code} to '{}'", user.username);
        }
        UserCommand::Revoke { username, code } => {
            let user = store.get_user_by_username(&username).await?;
            store.revoke_user_permission(user.id, &code).await?;
            println!("Revoked {code} from '{}'", user.username);
        }
        UserCommand::Deactivate { username } => {
            let user = store.get_user_by_username(&username).await?;
            store.set_user_active(user.id, false).await?;
            println!("Deactivated '{}'", user.username);
        }
        UserCommand::Delete { username } => {
            let user = store.get_user_by_username(&username).await?;
            store.delete_user(user.id).await?;
            tracing::info!(user = %user.username, id = user.id, "user deleted");
            println!("Deleted user '{}'", user.username);
        }
    }

    Ok(())
}
