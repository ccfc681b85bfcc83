use crate::error::VouchError;
use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::{Component, Path};

/// Writes `content` to `path` through a sibling temporary file, so readers see
/// either the previous file or the complete new one. Missing parent
/// directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file.persist(path).map_err(|e| InfrastructureError::Io(e.error))?;
    Ok(())
}

/// Rejects store keys that could escape their directory once joined.
pub fn safe_key(key: &str) -> Result<&str, VouchError> {
    let mut components = Path::new(key).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if key.is_empty() || !single_normal || key.contains(['/', '\\']) || key.starts_with('.') {
        return Err(VouchError::UnsafePath(key.to_string()));
    }
    Ok(key)
}
