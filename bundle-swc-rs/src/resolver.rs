//! Resolution of extensionless relative imports.
//!
//! Bundlers only try the exact specifier (plus a few JavaScript extensions),
//! so `import './util'` pointing at `util.ts` or `util/index.tsx` would be
//! missed. The resolver probes [`ACCEPTED_EXTENSIONS`] in order.

use crate::escape::is_virtual;
use crate::filter::ACCEPTED_EXTENSIONS;
use log::debug;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Returns the first existing file among `base + ext` (or `base/index + ext`
/// with `is_directory`) for every accepted extension, in priority order.
pub async fn resolve(base: &Path, is_directory: bool) -> Option<PathBuf> {
    for ext in ACCEPTED_EXTENSIONS {
        let candidate = if is_directory {
            base.join(format!("index{ext}"))
        } else {
            let mut path = OsString::from(base.as_os_str());
            path.push(ext);
            PathBuf::from(path)
        };
        if is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Resolves a relative `specifier` imported from `importer`.
///
/// Returns `None` (defer to the host) for entry modules, virtual modules and
/// bare or absolute specifiers, and when no candidate exists.
pub async fn resolve_import(specifier: &str, importer: Option<&str>) -> Option<PathBuf> {
    if is_virtual(specifier) {
        return None;
    }
    let importer = importer?;
    if !specifier.starts_with('.') {
        return None;
    }

    let importer_dir = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
    let base = absolutize(&importer_dir.join(specifier));

    if let Some(file) = resolve(&base, false).await {
        debug!("Resolved {} from {} to {}", specifier, importer, file.display());
        return Some(file);
    }
    if is_dir(&base).await {
        if let Some(file) = resolve(&base, true).await {
            debug!("Resolved {} from {} to {}", specifier, importer, file.display());
            return Some(file);
        }
    }
    None
}

pub(crate) async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

pub(crate) async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Lexically normalizes `path` and anchors it at the current directory when
/// it is relative. Symlinks are not followed.
pub(crate) fn absolutize(path: &Path) -> PathBuf {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize(&path)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
