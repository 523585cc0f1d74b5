use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};

pub const ORGANIZATION_KEY: &str = "AZURE_DEVOPS_ORGANIZATION";
pub const PROJECT_KEY: &str = "AZURE_DEVOPS_PROJECT";
pub const PAT_KEY: &str = "AZURE_DEVOPS_PAT";
pub const PREFIX_KEY: &str = "PRODUCT_PREFIX";
pub const OUTPUT_DIR_KEY: &str = "AC_EXPORT_OUTPUT_DIR";
pub const BASE_URL_KEY: &str = "AZURE_DEVOPS_BASE_URL";

pub const DEFAULT_PREFIX: &str = "eNr";
pub const DEFAULT_OUTPUT_DIR: &str = "userstories";
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// Settings for one run. Built once at startup and handed to the client and
/// exporter; nothing reads the environment after this point.
#[derive(Clone)]
pub struct Config {
    pub organization: String,
    pub project: String,
    pub pat: String,
    pub prefix: String,
    pub output_dir: PathBuf,
    pub base_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("pat", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("output_dir", &self.output_dir)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Optional `config.toml`. Every value here loses to the environment.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub azure_devops: Option<AzureDevOpsSection>,
    pub export: Option<ExportSection>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AzureDevOpsSection {
    pub organization: Option<String>,
    pub project: Option<String>,
    pub pat: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportSection {
    pub prefix: Option<String>,
    pub output_dir: Option<String>,
}

impl FileConfig {
    fn value(&self, key: &str) -> Option<String> {
        let ado = self.azure_devops.as_ref();
        let export = self.export.as_ref();
        match key {
            ORGANIZATION_KEY => ado.and_then(|s| s.organization.clone()),
            PROJECT_KEY => ado.and_then(|s| s.project.clone()),
            PAT_KEY => ado.and_then(|s| s.pat.clone()),
            BASE_URL_KEY => ado.and_then(|s| s.base_url.clone()),
            PREFIX_KEY => export.and_then(|s| s.prefix.clone()),
            OUTPUT_DIR_KEY => export.and_then(|s| s.output_dir.clone()),
            _ => None,
        }
    }
}

impl Config {
    /// Resolve every setting through `lookup` first and `file` second.
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F, file: &FileConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| {
                    file.value(key)
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                })
        };

        let organization = get(ORGANIZATION_KEY);
        let project = get(PROJECT_KEY);
        let pat = get(PAT_KEY);

        let missing: Vec<&str> = [
            (ORGANIZATION_KEY, organization.is_none()),
            (PROJECT_KEY, project.is_none()),
            (PAT_KEY, pat.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        match (organization, project, pat) {
            (Some(organization), Some(project), Some(pat)) => Ok(Self {
                organization,
                project,
                pat,
                prefix: get(PREFIX_KEY).unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
                output_dir: PathBuf::from(
                    get(OUTPUT_DIR_KEY).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
                ),
                base_url: get(BASE_URL_KEY)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            }),
            _ => Err(ExportError::missing_keys(&missing)),
        }
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ac-export")
        .join("config.toml")
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    toml::from_str(&contents)
        .map_err(|e| ExportError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Load configuration from the process environment, falling back to the
/// user's config file.
pub fn load_config() -> Result<Config> {
    let path = config_path();
    let file = load_file_config(&path)?;
    tracing::debug!(path = %path.display(), "resolved config file location");
    Config::from_lookup(|key| std::env::var(key).ok(), &file)
}
