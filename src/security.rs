//! Owner-only permissions for settings files
//!
//! Used when a store is configured with `secure_permissions(true)`.

use crate::error::{Error, Result};
use std::path::Path;

/// Restrict a settings file to its owner (Unix: 0o600)
///
/// On Windows this is a no-op; access is governed by ACLs there.
///
/// # Errors
///
/// * `Error::FileRead` - If the file metadata cannot be read
/// * `Error::FileWrite` - If the permissions cannot be changed
#[cfg(unix)]
pub fn set_secure_file_permissions(path: &Path) -> Result<()> {
    set_mode(path, 0o600)
}

/// Restrict a directory to its owner (Unix: 0o700)
///
/// # Errors
///
/// * `Error::FileRead` - If the directory metadata cannot be read
/// * `Error::FileWrite` - If the permissions cannot be changed
#[cfg(unix)]
pub fn set_secure_dir_permissions(path: &Path) -> Result<()> {
    set_mode(path, 0o700)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    perms.set_mode(mode);

    fs::set_permissions(path, perms).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create a directory (and parents) restricted to the owner
///
/// # Errors
///
/// * `Error::DirectoryCreate` - If the directory cannot be created
/// * `Error::FileWrite` - If the permissions cannot be changed
pub fn ensure_secure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreate {
        path: path.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    set_secure_dir_permissions(path)?;

    Ok(())
}

/// No-op on Windows (permissions managed via ACLs)
#[cfg(not(unix))]
pub fn set_secure_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// No-op on Windows (permissions managed via ACLs)
#[cfg(not(unix))]
pub fn set_secure_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
