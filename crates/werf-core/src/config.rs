use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// werf.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WerfConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default, rename = "image")]
    pub images: Vec<ImageConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (defaults to the project directory name)
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Log every walk decision at debug level
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub name: String,
    /// Git sources whose content feeds the image's stage digest.
    #[serde(default)]
    pub git: Vec<GitMapping>,
}

/// One `[[image.git]]` mapping: a subtree of the repository plus filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitMapping {
    /// Repository path to take files from (`/` for the whole tree)
    #[serde(default = "default_add")]
    pub add: String,
    /// Globs relative to `add`; when empty everything under `add` is taken
    #[serde(default)]
    pub include_paths: Vec<String>,
    /// Globs relative to `add` removed from the selection
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    /// Ignore file (dockerignore syntax) read from the commit tree
    #[serde(default)]
    pub ignore_file: Option<String>,
}

impl Default for GitMapping {
    fn default() -> Self {
        Self {
            add: default_add(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            ignore_file: None,
        }
    }
}

impl GitMapping {
    /// The mapping's base path in normalized repository-relative form.
    pub fn base_path(&self) -> crate::Result<String> {
        crate::path::normalize(&self.add)
    }
}

impl WerfConfig {
    /// Load from werf.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join("werf.toml");
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no werf.toml, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.clone(),
                source: e,
            })?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path,
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Look up an image by name.
    pub fn image(&self, name: &str) -> Option<&ImageConfig> {
        self.images.iter().find(|image| image.name == name)
    }

    fn validate(&self) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for image in &self.images {
            if !seen.insert(image.name.as_str()) {
                return Err(crate::Error::DuplicateImage {
                    name: image.name.clone(),
                });
            }
            for mapping in &image.git {
                mapping
                    .base_path()
                    .map_err(|e| crate::Error::InvalidGitMapping {
                        image: image.name.clone(),
                        reason: e.to_string(),
                    })?;
            }
        }
        Ok(())
    }
}

fn default_add() -> String {
    "/".to_owned()
}
