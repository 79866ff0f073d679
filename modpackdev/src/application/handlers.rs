use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use modpack_core::config::PackConfig;
use modpack_core::error::{ModpackError, Result};
use modpack_core::{
    Compression, Digest, ExtractOptions, HashType, ModDescriptor, Outcome, PackOptions,
    VerificationResult, extract, hash_file, pack, read_manifest, verify_archive,
};

pub struct PackArgs {
    pub root: PathBuf,
    pub out: Option<PathBuf>,
    pub compression: Option<String>,
    pub hash_type: Option<String>,
    pub workers: Option<usize>,
    pub config: Option<PathBuf>,
    pub overwrite: bool,
    pub mod_name: Option<String>,
    pub mod_version: Option<String>,
}

/// `.mod/mod.json` when present, with `--name`/`--version` layered on top.
fn resolve_descriptor(
    root: &Path,
    name: Option<String>,
    version: Option<String>,
) -> Result<ModDescriptor> {
    if !root.is_dir() {
        return Err(ModpackError::NotAMod {
            path: root.to_path_buf(),
        });
    }
    if ModDescriptor::config_path(root).is_file() {
        let mut desc = ModDescriptor::from_dir(root)?;
        if let Some(n) = name {
            desc.name = n;
        }
        if let Some(v) = version {
            desc.version = v;
        }
        return Ok(desc);
    }
    match (name, version) {
        (Some(n), Some(v)) => Ok(ModDescriptor::new(root, n, v)),
        _ => Err(ModpackError::Config(format!(
            "{} has no .mod/mod.json; pass --name and --version",
            root.display()
        ))),
    }
}

/// Flags win over the config file, which wins over built-in defaults.
fn pack_options(args: &PackArgs) -> Result<PackOptions> {
    let cfg = match &args.config {
        Some(p) => PackConfig::load(p)?,
        None => PackConfig::default(),
    };
    let compression = match args.compression.as_deref() {
        Some(s) => s.parse::<Compression>()?,
        None => cfg.compression,
    };
    let hash_type = match args.hash_type.as_deref() {
        Some(s) => Some(s.parse::<HashType>()?.ensure_registered()?),
        None => cfg.hash_type,
    };
    if args.workers == Some(0) {
        return Err(ModpackError::Config("--workers must be at least 1".into()));
    }
    Ok(PackOptions {
        compression,
        hash_type,
        workers: args.workers.or(cfg.workers),
        overwrite: args.overwrite || cfg.overwrite,
        ..Default::default()
    })
}

pub fn handle_pack(args: PackArgs) -> Result<ExitCode> {
    let opts = pack_options(&args)?;
    let desc = resolve_descriptor(&args.root, args.mod_name, args.mod_version)?;
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(desc.archive_file_name()));

    let manifest = pack(&desc, &out, Some(&opts))?;
    tracing::info!(
        name = manifest.name(),
        version = manifest.version(),
        files = manifest.len(),
        bytes = manifest.total_size(),
        compression = %opts.compression,
        hash = %manifest.hash_type(),
        out = %out.display(),
        "packed"
    );
    Ok(ExitCode::SUCCESS)
}

fn print_result(r: &VerificationResult) {
    for e in &r.entries {
        let tag = match e.outcome {
            Outcome::Match => "ok",
            Outcome::Mismatch => "MISMATCH",
            Outcome::Missing => "MISSING",
            Outcome::Extra => "EXTRA",
        };
        println!("{tag:>8}  {}", e.path);
    }
    println!(
        "{} {} ({}): {} ok, {} mismatch, {} missing, {} extra{}",
        r.name,
        r.version,
        r.hash_type,
        r.count(Outcome::Match),
        r.count(Outcome::Mismatch),
        r.count(Outcome::Missing),
        r.count(Outcome::Extra),
        if r.truncated { ", truncated" } else { "" }
    );
}

pub fn handle_verify(archive: PathBuf, json: bool) -> Result<ExitCode> {
    let result = verify_archive(&archive, None)?;
    if json {
        let s = serde_json::to_string_pretty(&result).map_err(io::Error::from)?;
        println!("{s}");
    } else {
        print_result(&result);
    }
    if result.is_intact() {
        tracing::info!(archive = %archive.display(), "verify: OK");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(
            archive = %archive.display(),
            failed = result.failures().count(),
            "verify: FAILED"
        );
        Ok(ExitCode::FAILURE)
    }
}

pub fn handle_list(archive: PathBuf) -> Result<ExitCode> {
    let info = read_manifest(&archive)?;
    let m = &info.manifest;
    println!(
        "{} {}  compression={} hash={}",
        m.name(),
        m.version(),
        info.compression,
        info.hash_type
    );
    for e in m.entries() {
        println!("{}  {:>10}  {}", e.digest, e.size, e.path);
    }
    println!("{} files, {} bytes", m.len(), m.total_size());
    Ok(ExitCode::SUCCESS)
}

pub fn handle_extract(archive: PathBuf, dest: PathBuf, overwrite: bool) -> Result<ExitCode> {
    let opts = ExtractOptions {
        overwrite,
        ..Default::default()
    };
    let result = extract(&archive, &dest, Some(&opts))?;
    tracing::info!(
        files = result.entries.len(),
        dest = %dest.display(),
        "extracted"
    );
    Ok(ExitCode::SUCCESS)
}

pub fn handle_hash(
    file: PathBuf,
    hash_type: Option<String>,
    expect: Option<String>,
) -> Result<ExitCode> {
    let ht = match hash_type.as_deref() {
        Some(s) => s.parse::<HashType>()?.ensure_registered()?,
        None => HashType::host_default(),
    };
    let expected = expect.as_deref().map(Digest::from_hex).transpose()?;
    let hashed = hash_file(&file, ht)?;
    println!("{}  {}  {}", hashed.digest, hashed.size, file.display());
    Ok(check_expected(&hashed.digest, expected.as_ref()))
}

fn check_expected(actual: &Digest, expected: Option<&Digest>) -> ExitCode {
    match expected {
        Some(want) if want != actual => {
            tracing::warn!(%want, %actual, "digest mismatch");
            ExitCode::FAILURE
        }
        _ => ExitCode::SUCCESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(root: &Path) -> PackArgs {
        PackArgs {
            root: root.to_path_buf(),
            out: None,
            compression: None,
            hash_type: None,
            workers: None,
            config: None,
            overwrite: false,
            mod_name: None,
            mod_version: None,
        }
    }

    #[test]
    fn missing_root_is_not_a_mod() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_descriptor(&dir.path().join("gone"), None, None),
            Err(ModpackError::NotAMod { .. })
        ));
    }

    #[test]
    fn expected_digest_decides_the_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("a.txt");
        fs::write(&f, "hello").unwrap();
        let actual = hash_file(&f, HashType::Xxh64).unwrap().digest;
        let same = Digest::from_hex(&actual.to_hex().to_uppercase()).unwrap();
        assert_eq!(check_expected(&actual, Some(&same)), ExitCode::SUCCESS);
        assert_eq!(check_expected(&actual, None), ExitCode::SUCCESS);
        let other = Digest::from_hex("0000000000000000").unwrap();
        assert_eq!(check_expected(&actual, Some(&other)), ExitCode::FAILURE);
        assert!(matches!(
            handle_hash(f, None, Some("not hex".into())),
            Err(ModpackError::Config(_))
        ));
    }

    #[test]
    fn descriptor_needs_name_and_version_without_mod_json() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_descriptor(dir.path(), Some("demo-mod".into()), None),
            Err(ModpackError::Config(_))
        ));
        let d = resolve_descriptor(dir.path(), Some("demo-mod".into()), Some("1".into())).unwrap();
        assert_eq!(d.archive_file_name(), "demo-mod-1.mpk");
    }

    #[test]
    fn flags_override_mod_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".mod")).unwrap();
        fs::write(
            dir.path().join(".mod/mod.json"),
            r#"{"name": "from-file", "version": "0.1.0"}"#,
        )
        .unwrap();
        let d = resolve_descriptor(dir.path(), None, Some("0.2.0".into())).unwrap();
        assert_eq!(d.name, "from-file");
        assert_eq!(d.version, "0.2.0");
    }

    #[test]
    fn flags_win_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("modpack.toml");
        fs::write(&cfg, "compression = \"strong\"\nhash_type = \"xxh32\"\nworkers = 2\n").unwrap();
        let mut a = args(dir.path());
        a.config = Some(cfg);
        a.compression = Some("store".into());
        let o = pack_options(&a).unwrap();
        assert_eq!(o.compression, Compression::Store);
        assert_eq!(o.hash_type, Some(HashType::Xxh32));
        assert_eq!(o.workers, Some(2));
    }

    #[test]
    fn unknown_hash_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(dir.path());
        a.hash_type = Some("md5".into());
        assert!(matches!(
            pack_options(&a),
            Err(ModpackError::UnsupportedHashType(_))
        ));
    }
}
