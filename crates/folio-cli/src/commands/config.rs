use anyhow::Result;
use std::path::Path;

use folio_core::config::FolioConfig;

pub fn run(base_dir: &Path) -> Result<()> {
    let config_path = FolioConfig::default_path(base_dir);
    let config = FolioConfig::load(&config_path)?;

    println!("Config: {}", config_path.display());
    println!();
    println!("  DB path:        {}", config.folio.db_path);
    println!("  Log filter:     {}", config.folio.log_filter);
    println!();

    if config.kinds.is_empty() {
        println!("  No custom resource kinds configured.");
        println!();
        println!("  Add kinds to {}:", config_path.display());
        println!("  [[kinds]]");
        println!("  name = \"workflow\"");
        println!("  template = \"%s_workflow\"");
    } else {
        println!("  Custom kinds ({}):", config.kinds.len());
        for k in &config.kinds {
            println!("    - {} (template={})", k.name, k.template);
        }
    }

    Ok(())
}
