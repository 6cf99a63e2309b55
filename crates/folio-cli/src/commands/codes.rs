use anyhow::{Result, bail};
use std::path::Path;

use folio_core::ResourceKind;

pub fn list(base_dir: &Path, kind: Option<&str>) -> Result<()> {
    let codec = super::load_codec(base_dir)?;

    let kinds: Vec<ResourceKind> = match kind {
        Some(name) => {
            let kind = ResourceKind::from(name);
            if !codec.contains(&kind) {
                bail!("unknown resource kind: {name}");
            }
            vec![kind]
        }
        None => codec.kinds().to_vec(),
    };

    println!("{:<16} {:<24} {}", "KIND", "TEMPLATE", "CODES");
    println!("{}", "-".repeat(90));
    for kind in &kinds {
        let codes = codec.codes_for(kind)?;
        println!(
            "{:<16} {:<24} {}",
            kind.name(),
            codec.template(kind).unwrap_or_default(),
            codes.join(", ")
        );
    }

    Ok(())
}

pub fn decode(base_dir: &Path, code: &str) -> Result<()> {
    let codec = super::load_codec(base_dir)?;
    let (action, kind) = codec.decode(code)?;

    println!("Code:     {code}");
    println!("Action:   {action}");
    println!("Kind:     {kind}");
    println!("Template: {}", codec.template(&kind).unwrap_or_default());

    Ok(())
}
