use crate::descriptor::PathFilter;
use crate::error::{ModpackError, Result};
use crate::util::sanitize::relative_slash_path;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A regular file selected for the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModFile {
    pub rel: String,
    pub path: PathBuf,
}

/// Enumerates every regular file under `root` that passes `filter`.
///
/// Symlinks are followed, but each real directory may be entered once: a
/// second arrival (a cycle, or an alias of a directory already walked) is an
/// `InvalidModStructure`, as is any link resolving outside the root. This
/// holds even for an acyclic alias such as `assets -> shared`. File links are
/// different: a file reached through two names is listed under both. Device
/// nodes, sockets and fifos are rejected rather than skipped.
pub fn walk_mod(root: &Path, filter: &PathFilter) -> Result<Vec<ModFile>> {
    if !root.is_dir() {
        return Err(ModpackError::NotAMod {
            path: root.to_path_buf(),
        });
    }
    let real_root = fs::canonicalize(root)?;
    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(real_root.clone());
    let mut files = Vec::new();

    for e in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let e = match e {
            Ok(e) => e,
            Err(err) => return Err(walk_error(err)),
        };
        if e.depth() == 0 {
            continue;
        }
        let p = e.path();
        let real = if e.path_is_symlink() {
            let target = fs::canonicalize(p).map_err(|_| {
                ModpackError::structure(format!("dangling symlink: {}", p.display()))
            })?;
            if !target.starts_with(&real_root) {
                return Err(ModpackError::structure(format!(
                    "symlink {} escapes the mod root",
                    p.display()
                )));
            }
            Some(target)
        } else {
            None
        };

        let ft = e.file_type();
        if ft.is_dir() {
            let real = match real {
                Some(r) => r,
                None => fs::canonicalize(p)?,
            };
            if !visited.insert(real) {
                return Err(ModpackError::structure(format!(
                    "directory {} is reachable more than once (symlink cycle or alias)",
                    p.display()
                )));
            }
            continue;
        }

        let rel = relative_slash_path(root, p)?;
        if !filter.matches(&rel) {
            continue;
        }
        if !ft.is_file() {
            return Err(ModpackError::structure(format!(
                "{rel} is not a regular file"
            )));
        }
        files.push(ModFile {
            rel,
            path: p.to_path_buf(),
        });
    }
    Ok(files)
}

fn walk_error(err: walkdir::Error) -> ModpackError {
    if let Some(ancestor) = err.loop_ancestor() {
        return ModpackError::structure(format!(
            "symlink cycle back to {}",
            ancestor.display()
        ));
    }
    let dangling = err
        .path()
        .is_some_and(|p| p.symlink_metadata().is_ok_and(|m| m.file_type().is_symlink()));
    if dangling {
        let p = err.path().map(|p| p.display().to_string()).unwrap_or_default();
        return ModpackError::structure(format!("dangling symlink: {p}"));
    }
    ModpackError::Io(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rels(files: &[ModFile]) -> Vec<&str> {
        files.iter().map(|f| f.rel.as_str()).collect()
    }

    #[test]
    fn lists_nested_files_with_slashes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/d")).unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::write(dir.path().join("b/c.txt"), "world").unwrap();
        fs::write(dir.path().join("b/d/e.bin"), [0u8; 3]).unwrap();
        let files = walk_mod(dir.path(), &PathFilter::allow_all()).unwrap();
        assert_eq!(rels(&files), ["a.txt", "b/c.txt", "b/d/e.bin"]);
    }

    #[test]
    fn filter_applies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "x").unwrap();
        fs::write(dir.path().join("drop.tmp"), "x").unwrap();
        let f = PathFilter::new(&[], &["*.tmp".into()]).unwrap();
        let files = walk_mod(dir.path(), &f).unwrap();
        assert_eq!(rels(&files), ["keep.txt"]);
    }

    #[test]
    fn missing_root_is_not_a_mod() {
        let dir = tempfile::tempdir().unwrap();
        let err = walk_mod(&dir.path().join("missing"), &PathFilter::allow_all()).unwrap_err();
        assert!(matches!(err, ModpackError::NotAMod { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/f.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();
        let err = walk_mod(dir.path(), &PathFilter::allow_all()).unwrap_err();
        assert!(matches!(err, ModpackError::InvalidModStructure(_)), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_root_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret"), "x").unwrap();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret"), dir.path().join("link"))
            .unwrap();
        let err = walk_mod(dir.path(), &PathFilter::allow_all()).unwrap_err();
        assert!(matches!(err, ModpackError::InvalidModStructure(_)), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn file_symlink_inside_root_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();
        let files = walk_mod(dir.path(), &PathFilter::allow_all()).unwrap();
        assert_eq!(rels(&files), ["a.txt", "b.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn special_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let _listener =
            std::os::unix::net::UnixListener::bind(dir.path().join("game.sock")).unwrap();
        let err = walk_mod(dir.path(), &PathFilter::allow_all()).unwrap_err();
        assert!(matches!(err, ModpackError::InvalidModStructure(_)), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn fifo_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let made = std::process::Command::new("mkfifo")
            .arg(dir.path().join("pipe"))
            .status()
            .is_ok_and(|s| s.success());
        if !made {
            return;
        }
        let err = walk_mod(dir.path(), &PathFilter::allow_all()).unwrap_err();
        assert!(
            matches!(err, ModpackError::InvalidModStructure(ref m) if m.contains("pipe")),
            "{err}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn directory_alias_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("shared")).unwrap();
        fs::write(dir.path().join("shared/tex.png"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("shared"), dir.path().join("assets"))
            .unwrap();
        let err = walk_mod(dir.path(), &PathFilter::allow_all()).unwrap_err();
        assert!(matches!(err, ModpackError::InvalidModStructure(_)), "{err}");
    }
}
