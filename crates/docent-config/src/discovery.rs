//! Finding and merging docent's config files.
//!
//! Two layers are consulted: the user file (`config.toml` in the user config
//! directory) and the project file (`docent.toml`). The project layer wins.
//! A layer that fails to parse is skipped with a warning so one bad file
//! never keeps the server from starting. CLI flags are applied by the caller.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, DocentConfig, Result};

const PROJECT_CONFIG_FILE: &str = "docent.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "DOCENT_CONFIG_DIR";

/// Where a config file sits in the precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    User,
    Project,
    /// A file named with `--config`; replaces discovery entirely.
    Explicit,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layer::User => "user",
            Layer::Project => "project",
            Layer::Explicit => "explicit",
        })
    }
}

/// One file that was considered.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: Layer,
    pub path: PathBuf,
    pub loaded: bool,
}

/// The merged configuration plus an account of how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: DocentConfig,
    /// Every file considered, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Load a single file, bypassing discovery. Unlike discovered layers a
    /// broken explicit file is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = load_config_file(path)?;
        Ok(Self {
            warnings: plaintext_key_warnings(&config),
            config,
            sources: vec![ConfigSource {
                layer: Layer::Explicit,
                path: path.to_path_buf(),
                loaded: true,
            }],
        })
    }

    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }

    fn merge_layer(&mut self, layer: Layer, path: PathBuf) {
        let loaded = path.is_file()
            && match load_config_file(&path) {
                Ok(config) => {
                    self.config.merge(config);
                    true
                }
                Err(e) => {
                    self.warnings
                        .push(format!("Failed to load {}: {}", path.display(), e));
                    false
                }
            };
        self.sources.push(ConfigSource { layer, path, loaded });
    }
}

/// Discover and merge the user and project layers.
///
/// `project_dir` defaults to the working directory.
pub fn load_config(project_dir: Option<&Path>) -> LoadedConfig {
    load_config_in(project_dir, None)
}

/// Like [`load_config`], with `user_dir` standing in for the user config
/// directory.
pub fn load_config_in(project_dir: Option<&Path>, user_dir: Option<&Path>) -> LoadedConfig {
    let mut loaded = LoadedConfig {
        config: DocentConfig::new(),
        sources: Vec::new(),
        warnings: Vec::new(),
    };

    let user_dir = user_dir.map(Path::to_path_buf).or_else(user_config_dir);
    if let Some(dir) = user_dir {
        loaded.merge_layer(Layer::User, dir.join(USER_CONFIG_FILE));
    }
    let project_file = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    loaded.merge_layer(Layer::Project, project_file);

    let warnings = plaintext_key_warnings(&loaded.config);
    loaded.warnings.extend(warnings);
    loaded
}

/// Parse one config file.
pub fn load_config_file(path: &Path) -> Result<DocentConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    DocentConfig::from_toml(&contents)
}

/// `DOCENT_CONFIG_DIR` if set, else `<platform config dir>/docent`.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("docent")),
    }
}

fn plaintext_key_warnings(config: &DocentConfig) -> Vec<String> {
    let inline = [
        (
            "vector",
            config.vector.as_ref().map(|v| (&v.api_key, &v.api_key_env)),
        ),
        (
            "embedding",
            config.embedding.as_ref().map(|e| (&e.api_key, &e.api_key_env)),
        ),
        (
            "generation",
            config.generation.as_ref().map(|g| (&g.api_key, &g.api_key_env)),
        ),
    ];

    inline
        .into_iter()
        .filter_map(|(section, keys)| {
            let (key, env) = keys?;
            key.as_deref().filter(|k| !k.is_empty())?;
            Some(format!(
                "[{}] contains a plaintext API key; set {} instead",
                section, env
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::PolicyKind;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_no_files_means_defaults() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let loaded = load_config_in(Some(project.path()), Some(user.path()));

        assert!(loaded.config.server.is_none());
        assert!(loaded.loaded_from().is_empty());
        let layers: Vec<Layer> = loaded.sources.iter().map(|s| s.layer).collect();
        assert_eq!(layers, vec![Layer::User, Layer::Project]);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_project_layer_overrides_user_layer() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(
            &user,
            "config.toml",
            "[server]\nbind = \"0.0.0.0:8080\"\n\n[policy]\nkind = \"keyword\"\n",
        );
        write(&project, "docent.toml", "[policy]\nkind = \"classify_only\"\n");

        let loaded = load_config_in(Some(project.path()), Some(user.path()));
        assert_eq!(loaded.config.server().bind, "0.0.0.0:8080");
        assert_eq!(loaded.config.policy().kind, PolicyKind::ClassifyOnly);
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_malformed_layer_becomes_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(&user, "config.toml", "[server\nbind = ");
        write(&project, "docent.toml", "[tools]\ntimeout_ms = 1200\n");

        let loaded = load_config_in(Some(project.path()), Some(user.path()));
        assert_eq!(loaded.config.tools().timeout_ms, 1200);
        assert!(!loaded.sources[0].loaded);
        assert!(loaded.sources[1].loaded);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("Failed to load"));
    }

    #[test]
    fn test_explicit_file_must_parse() {
        let dir = TempDir::new().unwrap();
        write(&dir, "custom.toml", "this is not valid toml {{{{");

        let err = LoadedConfig::from_file(&dir.path().join("custom.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_explicit_file_skips_discovery() {
        let dir = TempDir::new().unwrap();
        write(&dir, "custom.toml", "[policy]\nkind = \"keyword\"\n");

        let loaded = LoadedConfig::from_file(&dir.path().join("custom.toml")).unwrap();
        assert_eq!(loaded.config.policy().kind, PolicyKind::Keyword);
        assert_eq!(loaded.sources.len(), 1);
        assert_eq!(loaded.sources[0].layer, Layer::Explicit);
    }

    #[test]
    fn test_plaintext_key_warning_names_env_var() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(&project, "docent.toml", "[generation]\napi_key = \"sk-inline\"\n");

        let loaded = load_config_in(Some(project.path()), Some(user.path()));
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("[generation]"));
        assert!(loaded.warnings[0].contains("plaintext API key"));
        assert!(loaded.warnings[0].contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_empty_inline_key_is_not_flagged() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        write(&project, "docent.toml", "[vector]\napi_key = \"\"\n");

        let loaded = load_config_in(Some(project.path()), Some(user.path()));
        assert!(loaded.warnings.is_empty());
    }
}
