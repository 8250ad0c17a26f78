use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "mkrelease.toml";

/// Represents the complete configuration for mkrelease.
///
/// Contains the files a release touches, the project identity, and how to
/// reach the GitHub API.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub github: GitHubConfig,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("src/materialized/Cargo.toml")
}

fn default_license() -> PathBuf {
    PathBuf::from("LICENSE")
}

fn default_doc_versions() -> PathBuf {
    PathBuf::from("doc/user/config.toml")
}

/// Version-bearing files, relative to the repository root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PathsConfig {
    /// Cargo manifest whose `version` line is rewritten
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// License file carrying the "Licensed Work" and "Change Date" lines
    #[serde(default = "default_license")]
    pub license: PathBuf,

    /// Documentation config listing released versions
    #[serde(default = "default_doc_versions")]
    pub doc_versions: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            manifest: default_manifest(),
            license: default_license(),
            doc_versions: default_doc_versions(),
        }
    }
}

fn default_product_name() -> String {
    "Materialize".to_string()
}

fn default_cargo_package() -> String {
    "materialized".to_string()
}

fn default_upstream_repo() -> String {
    "MaterializeInc/materialize".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Name written into the license's "Licensed Work" line
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Package passed to `cargo check -p` to refresh the lockfile
    #[serde(default = "default_cargo_package")]
    pub cargo_package: String,

    /// `owner/name` of the upstream repository; used to recognize the
    /// upstream remote and to address the pull request API
    #[serde(default = "default_upstream_repo")]
    pub upstream_repo: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            product_name: default_product_name(),
            cargo_package: default_cargo_package(),
            upstream_repo: default_upstream_repo(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_max_concurrent_requests() -> usize {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitHubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// File holding the personal access token. Defaults to
    /// `~/.config/materialize/dev-tools-access-token`.
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    /// Upper bound on pull request lookups in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_base: default_api_base(),
            token_path: None,
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl GitHubConfig {
    /// The configured token path, or the default under the home directory.
    pub fn resolved_token_path(&self) -> PathBuf {
        match &self.token_path {
            Some(path) => path.clone(),
            None => dirs::home_dir()
                .unwrap_or_default()
                .join(".config/materialize/dev-tools-access-token"),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `mkrelease.toml` in current directory
/// 3. `mkrelease.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.paths.manifest, PathBuf::from("src/materialized/Cargo.toml"));
        assert_eq!(config.paths.license, PathBuf::from("LICENSE"));
        assert_eq!(config.project.upstream_repo, "MaterializeInc/materialize");
        assert_eq!(config.github.max_concurrent_requests, 10);
        assert_eq!(config.github.token_path, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[project]
product_name = "Widget"
"#,
        )
        .unwrap();
        assert_eq!(config.project.product_name, "Widget");
        assert_eq!(config.project.cargo_package, "materialized");
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn test_explicit_token_path() {
        let github = GitHubConfig {
            token_path: Some(PathBuf::from("/tmp/token")),
            ..GitHubConfig::default()
        };
        assert_eq!(github.resolved_token_path(), PathBuf::from("/tmp/token"));
    }

    #[test]
    fn test_default_token_path() {
        let path = GitHubConfig::default().resolved_token_path();
        assert!(path.ends_with(".config/materialize/dev-tools-access-token"));
    }
}
