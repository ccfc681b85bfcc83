// vouch-core/src/infrastructure/config/source.rs

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::batch::{BatchIdentifier, BatchLocator, DataFormat, Schema};
use crate::domain::context::SourceConfig;
use crate::domain::error::DomainError;

/// Turns a configured source into a locator. Relative paths are resolved
/// against the project directory; `extra` identifiers win over configured ones.
pub fn resolve_locator(
    project_dir: &Path,
    source: &SourceConfig,
    extra: &BTreeMap<String, String>,
) -> Result<BatchLocator, DomainError> {
    let path = Path::new(&source.path);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    };

    let asset = source.data_asset_name.as_deref().unwrap_or(&source.name);
    let mut id = BatchIdentifier::new(asset);
    for (k, v) in source.identifiers.iter().chain(extra) {
        id = id.with(k.clone(), v.clone());
    }

    Ok(BatchLocator {
        path,
        format: DataFormat::Csv,
        schema: Schema::from_ddl(&source.schema)?,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn source() -> SourceConfig {
        SourceConfig {
            name: "trips".to_string(),
            path: "data/trips.csv".to_string(),
            schema: "`id` BIGINT, `fare` DOUBLE".to_string(),
            data_asset_name: None,
            identifiers: BTreeMap::from([("pipeline_stage".to_string(), "dev".to_string())]),
        }
    }

    #[test]
    fn test_resolve_locator() -> Result<()> {
        let extra = BTreeMap::from([
            ("pipeline_stage".to_string(), "prod".to_string()),
            ("run_id".to_string(), "42".to_string()),
        ]);
        let loc = resolve_locator(Path::new("/project"), &source(), &extra)?;

        assert_eq!(loc.path, Path::new("/project/data/trips.csv"));
        assert_eq!(loc.schema.len(), 2);
        assert_eq!(loc.id.data_asset_name, "trips");
        assert_eq!(loc.id.identifiers.get("pipeline_stage").map(String::as_str), Some("prod"));
        assert_eq!(loc.id.identifiers.len(), 2);
        Ok(())
    }

    #[test]
    fn test_bad_schema_is_rejected() {
        let mut src = source();
        src.schema = "`id` GEOMETRY".to_string();
        let res = resolve_locator(Path::new("."), &src, &BTreeMap::new());
        assert!(matches!(res, Err(DomainError::InvalidParameter { .. })));
    }
}
