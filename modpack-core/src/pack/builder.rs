use crate::container::manifest::{Manifest, ManifestEntry};
use crate::descriptor::ModDescriptor;
use crate::error::{ModpackError, Result};
use crate::events::{Event, Hooks};
use crate::hash::{HashType, hash_reader};
use crate::pack::walker::{ModFile, walk_mod};
use rayon::prelude::*;
use std::fs::File;
use std::io::ErrorKind;

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Overrides the descriptor's hash type.
    pub hash_type: Option<HashType>,
    /// Size of a dedicated hashing pool; `None` uses rayon's global pool.
    pub workers: Option<usize>,
    pub hooks: Hooks,
}

/// Hash type precedence: options, then descriptor, then the host default.
/// The choice is checked against the registry before anything is read.
pub fn resolve_hash_type(desc: &ModDescriptor, opts: &BuildOptions) -> Result<HashType> {
    opts.hash_type
        .or(desc.hash_type)
        .unwrap_or_else(HashType::host_default)
        .ensure_registered()
}

pub fn build_manifest(desc: &ModDescriptor, opts: Option<&BuildOptions>) -> Result<Manifest> {
    let default_opts = BuildOptions::default();
    let opts = opts.unwrap_or(&default_opts);
    let hash_type = resolve_hash_type(desc, opts)?;

    if !desc.root.is_dir() {
        return Err(ModpackError::NotAMod {
            path: desc.root.clone(),
        });
    }
    desc.validate()?;
    let filter = desc.filter()?;
    let files = walk_mod(&desc.root, &filter)?;
    if files.is_empty() {
        return Err(ModpackError::EmptyModDirectory {
            path: desc.root.clone(),
        });
    }

    let hash_all = || -> Result<Vec<ManifestEntry>> {
        files
            .par_iter() // each file independent; order restored by the sort below
            .map(|f| hash_one(f, hash_type, &opts.hooks))
            .collect()
    };
    let entries = match opts.workers {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n.max(1))
            .build()
            .map_err(|e| ModpackError::Config(format!("hashing pool: {e}")))?
            .install(hash_all)?,
        None => hash_all()?,
    };

    Manifest::new(&desc.name, &desc.version, hash_type, entries)
}

fn hash_one(f: &ModFile, hash_type: HashType, hooks: &Hooks) -> Result<ManifestEntry> {
    hooks.check()?;
    hooks.emit(Event::HashingFile { path: &f.rel });
    let mut src = File::open(&f.path).map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => {
            ModpackError::structure(format!("{} is not readable", f.rel))
        }
        _ => ModpackError::Io(e),
    })?;
    // Size comes from this pass, never from a separate stat.
    let hashed = hash_reader(&mut src, hash_type)?;
    hooks.emit(Event::FileHashed {
        path: &f.rel,
        size: hashed.size,
    });
    Ok(ManifestEntry {
        path: f.rel.clone(),
        size: hashed.size,
        hash_type,
        digest: hashed.digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::RecordingSink;
    use std::fs;
    use std::sync::Arc;

    fn scratch_mod() -> (tempfile::TempDir, ModDescriptor) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::write(dir.path().join("b/c.txt"), "world").unwrap();
        let desc = ModDescriptor::new(dir.path(), "demo-mod", "1.0.0");
        (dir, desc)
    }

    #[test]
    fn builds_sorted_entries() {
        let (_dir, desc) = scratch_mod();
        let opts = BuildOptions {
            hash_type: Some(HashType::Xxh64),
            workers: Some(2),
            hooks: Hooks::silent(),
        };
        let m = build_manifest(&desc, Some(&opts)).unwrap();
        let paths: Vec<_> = m.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["a.txt", "b/c.txt"]);
        assert_eq!(m.entries()[0].size, 5);
        assert_eq!(m.hash_type(), HashType::Xxh64);
        assert_eq!(m.name(), "demo-mod");
    }

    #[test]
    fn empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("only-dirs")).unwrap();
        let desc = ModDescriptor::new(dir.path(), "demo-mod", "1");
        assert!(matches!(
            build_manifest(&desc, None),
            Err(ModpackError::EmptyModDirectory { .. })
        ));
    }

    #[test]
    fn nonexistent_root() {
        let dir = tempfile::tempdir().unwrap();
        let desc = ModDescriptor::new(dir.path().join("gone"), "demo-mod", "1");
        assert!(matches!(
            build_manifest(&desc, None),
            Err(ModpackError::NotAMod { .. })
        ));
    }

    #[test]
    fn descriptor_hash_type_is_used_unless_overridden() {
        let (_dir, desc) = scratch_mod();
        let desc = desc.with_hash_type(HashType::Xxh32);
        let silent = BuildOptions {
            hooks: Hooks::silent(),
            ..Default::default()
        };
        assert_eq!(
            build_manifest(&desc, Some(&silent)).unwrap().hash_type(),
            HashType::Xxh32
        );
        let forced = BuildOptions {
            hash_type: Some(HashType::Xxh3),
            ..silent
        };
        let m = build_manifest(&desc, Some(&forced)).unwrap();
        assert!(m.entries().iter().all(|e| e.hash_type == HashType::Xxh3));
    }

    #[test]
    fn cancelled_before_hashing() {
        let (_dir, desc) = scratch_mod();
        let opts = BuildOptions {
            hooks: Hooks::silent(),
            ..Default::default()
        };
        opts.hooks.cancel();
        assert!(matches!(
            build_manifest(&desc, Some(&opts)),
            Err(ModpackError::Cancelled)
        ));
    }

    #[test]
    fn emits_progress_per_file() {
        let (_dir, desc) = scratch_mod();
        let sink = Arc::new(RecordingSink::default());
        let opts = BuildOptions {
            hooks: Hooks::new(sink.clone()),
            ..Default::default()
        };
        build_manifest(&desc, Some(&opts)).unwrap();
        assert_eq!(sink.count("HashingFile"), 2);
        assert_eq!(sink.count("FileHashed"), 2);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_invalid_structure() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, desc) = scratch_mod();
        let locked = dir.path().join("b/c.txt");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if File::open(&locked).is_ok() {
            // Running with privileges that ignore file modes.
            return;
        }
        let opts = BuildOptions {
            hooks: Hooks::silent(),
            ..Default::default()
        };
        let err = build_manifest(&desc, Some(&opts)).unwrap_err();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(err, ModpackError::InvalidModStructure(_)), "{err}");
    }
}
