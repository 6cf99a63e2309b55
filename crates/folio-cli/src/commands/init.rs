use anyhow::Result;
use std::path::Path;

use folio_auth::{DirectoryStore, SqliteDirectoryStore};
use folio_core::config::FolioConfig;

pub async fn run(base_dir: &Path) -> Result<()> {
    println!("Initializing Folio in {}", base_dir.display());

    std::fs::create_dir_all(base_dir)?;

    let config_path = FolioConfig::default_path(base_dir);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = FolioConfig::default_config(base_dir);
        config.save(&config_path)?;
        println!("Created config: {}", config_path.display());
    }

    // Reload so custom kinds in an existing config are validated and seeded
    let config = FolioConfig::load(&config_path)?;
    let codec = config.codec()?;

    let store = SqliteDirectoryStore::open(&config.folio.db_path)?;
    store.migrate().await?;
    store.seed_defaults(&codec).await?;
    println!("Initialized directory: {}", config.folio.db_path);
    println!(
        "Registered {} permission codes for {} resource kinds",
        codec.all_codes().len(),
        codec.kinds().len()
    );

    println!("\nFolio initialized. Next steps:");
    println!("  1. Run `folio user add <name> --superuser` to create an administrator");
    println!("  2. Add custom resource kinds to {} and re-run `folio init`", config_path.display());

    Ok(())
}
