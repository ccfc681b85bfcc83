// vouch-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::context::{ContextConfig, Engine};
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["vouch.yaml", "vouch.yml"];

#[instrument(skip(project_dir))]
pub fn load_context_config(project_dir: &Path) -> Result<ContextConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    let content = fs::read_to_string(&config_path)?;
    let mut config: ContextConfig = serde_yaml::from_str(&content)?;

    // Layering: VOUCH_ROOT_DIRECTORY=/tmp/gx vouch run ...
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    if config.usage_statistics {
        info!("Usage statistics enabled (recorded locally only)");
    }
    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

/// Applies `VOUCH_*` overrides read through `lookup`.
pub fn apply_env_overrides(
    config: &mut ContextConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), InfrastructureError> {
    if let Some(val) = lookup("VOUCH_ROOT_DIRECTORY") {
        info!(old = ?config.root_directory, new = ?val, "Overriding root directory via ENV");
        config.root_directory = val;
    }
    if let Some(val) = lookup("VOUCH_ENGINE") {
        let engine: Engine = val.parse().map_err(InfrastructureError::ConfigError)?;
        info!(old = %config.engine, new = %engine, "Overriding engine via ENV");
        config.engine = engine;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_load_yml_variant() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("vouch.yml"), "name: taxi\nengine: duckdb\n")?;

        let cfg = load_context_config(dir.path())?;
        assert_eq!(cfg.name, "taxi");
        assert_eq!(cfg.engine, Engine::DuckDB);
        Ok(())
    }

    #[test]
    fn test_missing_config() -> Result<()> {
        let dir = tempdir()?;
        let res = load_context_config(dir.path());
        assert!(matches!(res, Err(InfrastructureError::ConfigNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("vouch.yaml"), "name: \"\"\n")?;
        let res = load_context_config(dir.path());
        assert!(matches!(res, Err(InfrastructureError::ConfigError(_))));
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let mut cfg = ContextConfig::new("taxi");
        apply_env_overrides(&mut cfg, |key| match key {
            "VOUCH_ROOT_DIRECTORY" => Some("/tmp/gx".to_string()),
            "VOUCH_ENGINE" => Some("duckdb".to_string()),
            _ => None,
        })?;
        assert_eq!(cfg.root_directory, "/tmp/gx");
        assert_eq!(cfg.engine, Engine::DuckDB);

        let bad = apply_env_overrides(&mut cfg, |key| (key == "VOUCH_ENGINE").then(|| "spark".to_string()));
        assert!(matches!(bad, Err(InfrastructureError::ConfigError(_))));
        Ok(())
    }
}
