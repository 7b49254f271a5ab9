//! Project configuration for OpenAPI assertions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAPI document, relative to `project_root`
    pub schema: PathBuf,

    /// Directory the schema path is resolved against (default: current directory)
    #[serde(default)]
    pub project_root: Option<PathBuf>,

    /// Base URL used by `apiassert check` to send live requests
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP headers sent with every live request (auth, API keys, ...)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: PathBuf::from("openapi.yaml"),
            project_root: None,
            base_url: None,
            headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Config pointing at `schema`, everything else defaulted.
    #[must_use]
    pub fn with_schema(schema: impl Into<PathBuf>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Schema path joined onto the project root.
    ///
    /// An absolute `schema` is returned as-is.
    #[must_use]
    pub fn schema_path(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => root.join(&self.schema),
            None => Path::new(".").join(&self.schema),
        }
    }

    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.apiassert.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".apiassert.toml", ".apiassert.json", "apiassert.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apiassert configuration

# OpenAPI / Swagger document, relative to project_root
schema = "openapi.yaml"

# Directory the schema path is resolved against (default: current directory)
# project_root = "."

# Server used by `apiassert check`
# base_url = "http://localhost:8080"

# HTTP headers sent with live requests
[headers]
Accept = "application/json"
# Authorization = "Bearer your-token-here"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
