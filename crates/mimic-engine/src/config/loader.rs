use super::schema::MimicConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MIMIC_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from, in order:
    /// 1. the file named by `$MIMIC_CONFIG` (must exist when set)
    /// 2. ./mimic.yaml
    /// 3. ~/.mimic/config.yaml
    /// 4. Default configuration
    pub async fn load_default() -> Result<MimicConfig, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Self::load_from(Path::new(&path)).await;
        }
        Self::load_first(&Self::search_paths(dirs::home_dir())).await
    }

    /// Implicit locations, most specific first.
    pub fn search_paths(home: Option<PathBuf>) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./mimic.yaml")];
        if let Some(home) = home {
            paths.push(home.join(".mimic").join("config.yaml"));
        }
        paths
    }

    /// Loads the first existing file, or the defaults when none exists.
    pub async fn load_first(paths: &[PathBuf]) -> Result<MimicConfig, ConfigError> {
        for path in paths {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Self::load_from(path).await;
            }
        }
        tracing::info!("No config file found, using defaults");
        Ok(MimicConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<MimicConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::parse(&content)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<MimicConfig, ConfigError> {
        let config: MimicConfig = serde_yaml::from_str(content)?;
        tracing::debug!("Parsed configuration: {:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_config_comes_after_local() {
        let paths = ConfigLoader::search_paths(Some(PathBuf::from("/home/u")));
        assert_eq!(paths[0], PathBuf::from("./mimic.yaml"));
        assert_eq!(paths[1], PathBuf::from("/home/u/.mimic/config.yaml"));
        assert_eq!(ConfigLoader::search_paths(None).len(), 1);
    }

    #[tokio::test]
    async fn first_existing_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let present = dir.path().join("present.yaml");
        tokio::fs::write(&present, "recorder:\n  capture_mouse_moves: true\n")
            .await
            .unwrap();

        let config = ConfigLoader::load_first(&[missing.clone(), present])
            .await
            .unwrap();
        assert!(config.recorder.capture_mouse_moves);

        let config = ConfigLoader::load_first(&[missing]).await.unwrap();
        assert!(!config.recorder.capture_mouse_moves);
    }

    #[tokio::test]
    async fn unreadable_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.yaml");
        let err = ConfigLoader::load_from(&missing).await.unwrap_err();
        assert!(err.to_string().contains("gone.yaml"));
    }
}
