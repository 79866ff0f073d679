use crate::error::{ModpackError, Result};
use std::path::{Component, Path, PathBuf};

/// Forward-slash relative path of `path` under `root`.
///
/// Only normal components are accepted; anything that could climb out of the
/// root (`..`, a prefix, an absolute path) is rejected.
pub fn relative_slash_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        ModpackError::structure(format!(
            "{} is not under mod root {}",
            path.display(),
            root.display()
        ))
    })?;
    let mut parts = Vec::new();
    for c in rel.components() {
        match c {
            Component::Normal(s) => {
                let s = s.to_str().ok_or_else(|| {
                    ModpackError::structure(format!("non UTF-8 path: {}", path.display()))
                })?;
                parts.push(s);
            }
            Component::CurDir => {}
            _ => {
                return Err(ModpackError::structure(format!(
                    "path escapes mod root: {}",
                    path.display()
                )));
            }
        }
    }
    if parts.is_empty() {
        return Err(ModpackError::structure(format!(
            "empty relative path for {}",
            path.display()
        )));
    }
    Ok(parts.join("/"))
}

/// True when `rel` is a forward-slash path that stays inside its root.
pub fn is_safe_relative(rel: &str) -> bool {
    !rel.is_empty()
        && !rel.starts_with('/')
        && !rel.contains('\\')
        && !rel.contains('\0')
        && rel
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && !seg.contains(':'))
}

pub fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    if !is_safe_relative(rel) {
        return Err(ModpackError::corrupt(format!("unsafe path: {rel}")));
    }
    Ok(rel.split('/').fold(root.to_path_buf(), |p, seg| p.join(seg)))
}
