use crate::error::{ModpackError, Result};
use crate::events::{Event, Hooks};
use crate::read::stream::ContainerReader;
use crate::read::verify::{Tally, VerificationResult};
use crate::util::sanitize::safe_join;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

#[derive(Clone, Debug, Default)]
pub struct ExtractOptions {
    /// Replace files that already exist under `dest`.
    pub overwrite: bool,
    pub hooks: Hooks,
}

/// Unpack `archive` into the existing directory `dest`.
///
/// Bodies land in a staging directory inside `dest` and are checked as they
/// stream. Files are moved into place only if every entry matched; otherwise
/// the staging directory is dropped and `NotIntact` returned.
pub fn extract(
    archive: &Path,
    dest: &Path,
    opts: Option<&ExtractOptions>,
) -> Result<VerificationResult> {
    let default_opts = ExtractOptions::default();
    let opts = opts.unwrap_or(&default_opts);
    let hooks = &opts.hooks;

    if !dest.is_dir() {
        return Err(io::Error::new(
            ErrorKind::NotADirectory,
            format!("{} is not a directory", dest.display()),
        )
        .into());
    }

    let f = File::open(archive)?;
    let mut reader = ContainerReader::open(BufReader::new(f))?;
    let manifest = reader.manifest().clone();

    // Every target is checked up front so publishing cannot stop halfway.
    for e in manifest.entries() {
        check_target(dest, &e.path, opts.overwrite)?;
    }

    let stage = tempfile::Builder::new()
        .prefix(".modpack-extract-")
        .tempdir_in(dest)?;

    let mut tally = Tally::new(&manifest);
    loop {
        hooks.check()?;
        let pending = reader.pending_entry().map(|e| e.path.clone());
        let body = match pending {
            Some(rel) => {
                let staged = safe_join(stage.path(), &rel)?;
                if let Some(parent) = staged.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = BufWriter::new(File::create(&staged)?);
                let body = reader.next_body(&mut out)?;
                out.flush()?;
                body
            }
            None => reader.next_body(&mut io::sink())?,
        };
        if !tally.record(&manifest, body, hooks) {
            break;
        }
    }
    let result = tally.finish();

    if !result.is_intact() {
        return Err(ModpackError::NotIntact {
            failed: result.failures().count(),
        });
    }

    for e in manifest.entries() {
        let staged = safe_join(stage.path(), &e.path)?;
        let target = safe_join(dest, &e.path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if target.exists() {
            let message = format!("replacing {}", target.display());
            hooks.emit(Event::Warning { message: &message });
        }
        fs::rename(&staged, &target)?;
        hooks.emit(Event::ExtractedFile { path: &e.path });
    }
    stage.close()?;
    Ok(result)
}

fn check_target(dest: &Path, rel: &str, overwrite: bool) -> Result<()> {
    let target = safe_join(dest, rel)?;
    let mut parent = dest.to_path_buf();
    let segments: Vec<&str> = rel.split('/').collect();
    for seg in &segments[..segments.len() - 1] {
        parent.push(seg);
        if fs::symlink_metadata(&parent).is_ok_and(|m| !m.is_dir()) {
            return Err(io::Error::new(
                ErrorKind::NotADirectory,
                format!("{} is in the way of {rel}", parent.display()),
            )
            .into());
        }
    }
    match fs::symlink_metadata(&target) {
        Ok(m) if m.is_dir() => Err(io::Error::new(
            ErrorKind::IsADirectory,
            format!("{} is a directory", target.display()),
        )
        .into()),
        Ok(_) if !overwrite => Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        )
        .into()),
        _ => Ok(()),
    }
}
