// vouch-core/src/application/clean.rs

use std::fs;
use std::path::{Component, Path};

use crate::application::context::DataContext;
use crate::error::VouchError;

/// Removes the configured clean targets (relative to the store root).
/// Returns the targets that were actually removed.
pub fn clean_project(ctx: &DataContext) -> Result<Vec<String>, VouchError> {
    tracing::info!("Initializing cleanup sequence");

    let root = ctx.store().root();
    let mut removed = Vec::new();
    for target in &ctx.config().clean_targets {
        // Path traversal guard: plain relative names only
        let rel = Path::new(target);
        if rel.as_os_str().is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(VouchError::UnsafePath(target.clone()));
        }

        let full_path = root.join(rel);
        if full_path.is_dir() {
            fs::remove_dir_all(&full_path)?;
        } else if full_path.exists() {
            fs::remove_file(&full_path)?;
        } else {
            continue;
        }
        tracing::info!(target = %target, "Artifact removed");
        removed.push(target.clone());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::fixtures;
    use crate::domain::context::ContextConfig;
    use anyhow::Result;

    #[test]
    fn test_clean_removes_uncommitted_only() -> Result<()> {
        let (_dir, ctx) = fixtures::project()?;
        ctx.create_registry("taxi", false)?;
        ctx.build_data_docs()?;
        assert!(ctx.store().root().join("uncommitted").is_dir());

        assert_eq!(clean_project(&ctx)?, vec!["uncommitted"]);
        assert!(!ctx.store().root().join("uncommitted").exists());
        assert!(ctx.store().root().join("expectations/taxi.json").is_file());

        assert!(clean_project(&ctx)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_clean_rejects_traversal() -> Result<()> {
        let (dir, _) = fixtures::project()?;
        let mut config = ContextConfig::new("taxi");
        config.clean_targets = vec!["../data".to_string()];
        let ctx = DataContext::new(dir.path(), config)?;

        assert!(matches!(clean_project(&ctx), Err(VouchError::UnsafePath(_))));
        assert!(dir.path().join("data/trips.csv").is_file());
        Ok(())
    }
}
