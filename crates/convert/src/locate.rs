//! Locating the LibreOffice executable.

use report_core::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Executable names tried on `PATH`, in order.
pub const CANDIDATES: &[&str] = &["soffice", "soffice.exe"];

/// Resolve the converter executable.
///
/// A configured path is used as-is when it names an existing file; a bare
/// name such as `soffice` is looked up on `PATH`. Without configuration the
/// [`CANDIDATES`] are tried on `PATH`.
pub fn find_executable(configured: Option<&Path>) -> Result<PathBuf> {
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    find_executable_in(configured, &path_var)
}

/// Like [`find_executable`] with an explicit `PATH` value.
pub fn find_executable_in(configured: Option<&Path>, path_var: &OsStr) -> Result<PathBuf> {
    match configured {
        Some(path) if path.components().count() > 1 || path.is_absolute() => {
            if is_executable(path) {
                Ok(path.to_path_buf())
            } else {
                Err(Error::ConverterNotFound(format!(
                    "LibreOffice executable not found at {}",
                    path.display()
                )))
            }
        }
        Some(name) => search_path(name.as_os_str(), path_var).ok_or_else(|| {
            Error::ConverterNotFound(format!(
                "LibreOffice '{}' not found in PATH",
                name.display()
            ))
        }),
        None => CANDIDATES
            .iter()
            .find_map(|name| search_path(OsStr::new(name), path_var))
            .ok_or_else(|| {
                Error::ConverterNotFound(
                    "LibreOffice 'soffice' not found in PATH. Set LIBREOFFICE_PATH or install LibreOffice."
                        .to_string(),
                )
            }),
    }
}

fn search_path(name: &OsStr, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
