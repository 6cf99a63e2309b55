use crate::codec::PermissionCodec;
use crate::error::{FolioError, Result};
use crate::types::ResourceKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level Folio configuration stored as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioConfig {
    pub folio: FolioSettings,
    /// Resource kinds registered on top of the built-in ones.
    #[serde(default)]
    pub kinds: Vec<KindConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioSettings {
    /// Path to the SQLite directory database (users, groups, grants).
    pub db_path: String,
    /// Tracing filter in `RUST_LOG` syntax, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindConfig {
    pub name: String,
    /// Code template with a single `%s` slot, e.g. `%s_workflow`.
    pub template: String,
}

fn default_log_filter() -> String {
    "folio=info".to_string()
}

impl FolioConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FolioError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FolioError::TomlDe(e.to_string()))
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| FolioError::TomlSer(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config for `folio init`.
    pub fn default_config(base_dir: &Path) -> Self {
        Self {
            folio: FolioSettings {
                db_path: base_dir.join("folio.db").display().to_string(),
                log_filter: default_log_filter(),
            },
            kinds: vec![],
        }
    }

    /// Build the permission codec: built-in kinds plus the configured ones.
    /// Template collisions surface here, at startup.
    pub fn codec(&self) -> Result<PermissionCodec> {
        let mut builder = PermissionCodec::builder().with_builtin()?;
        for kind in &self.kinds {
            let resource = ResourceKind::from(kind.name.as_str());
            if !matches!(resource, ResourceKind::Custom(_)) {
                return Err(FolioError::Config(format!(
                    "kind `{}` is built in and cannot be redefined",
                    kind.name
                )));
            }
            builder = builder.register(resource, kind.template.as_str())?;
        }
        Ok(builder.build())
    }

    /// Resolve the config file path: `<base_dir>/folio.toml`
    pub fn default_path(base_dir: &Path) -> PathBuf {
        base_dir.join("folio.toml")
    }

    /// Resolve the default folio home directory: `~/.folio`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".folio"))
            .ok_or_else(|| FolioError::Config("Cannot determine home directory".to_string()))
    }
}
