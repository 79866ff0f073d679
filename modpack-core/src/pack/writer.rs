use crate::codec::{Compression, Encoder};
use crate::container::frame::write_prefix;
use crate::container::manifest::{Manifest, ManifestEntry};
use crate::container::superblock::Superblock;
use crate::descriptor::ModDescriptor;
use crate::error::{ModpackError, Result};
use crate::events::{Event, Hooks};
use crate::hash::{CHUNK_SIZE, HashType};
use crate::pack::builder::{BuildOptions, build_manifest};
use crate::util::hash_forward::HashingForward;
use crate::util::sanitize::safe_join;
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub compression: Compression,
    /// Replace an existing destination instead of failing.
    pub overwrite: bool,
    pub hooks: Hooks,
}

#[derive(Clone, Debug, Default)]
pub struct PackOptions {
    pub compression: Compression,
    pub hash_type: Option<HashType>,
    pub workers: Option<usize>,
    pub overwrite: bool,
    pub hooks: Hooks,
}

impl PackOptions {
    fn build(&self) -> BuildOptions {
        BuildOptions {
            hash_type: self.hash_type,
            workers: self.workers,
            hooks: self.hooks.clone(),
        }
    }

    fn write(&self) -> WriteOptions {
        WriteOptions {
            compression: self.compression,
            overwrite: self.overwrite,
            hooks: self.hooks.clone(),
        }
    }
}

/// Build the manifest for `desc` and publish the archive at `out`.
pub fn pack(desc: &ModDescriptor, out: &Path, opts: Option<&PackOptions>) -> Result<Manifest> {
    let default_opts = PackOptions::default();
    let opts = opts.unwrap_or(&default_opts);
    let manifest = build_manifest(desc, Some(&opts.build()))?;
    write_archive(&manifest, &desc.root, out, Some(&opts.write()))?;
    Ok(manifest)
}

/// Serialize into any writer (e.g. an in-memory buffer).
///
/// Layout: superblock, then one compressed stream holding the size-prefixed
/// manifest followed by each body, size-prefixed, in manifest order.
pub fn write_archive_to<W: Write>(
    manifest: &Manifest,
    root: &Path,
    mut out: W,
    opts: Option<&WriteOptions>,
) -> Result<W> {
    let default_opts = WriteOptions::default();
    let opts = opts.unwrap_or(&default_opts);
    let hooks = &opts.hooks;

    Superblock::new(opts.compression, manifest.hash_type()).write_to(&mut out)?;
    {
        let mut enc = opts
            .compression
            .codec()
            .encoder(&mut out)
            .map_err(ModpackError::Compression)?;

        let man_bytes = manifest.to_bytes()?;
        write_prefix(&mut enc, man_bytes.len() as u64).map_err(ModpackError::Compression)?;
        enc.write_all(&man_bytes)
            .map_err(ModpackError::Compression)?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        for (index, entry) in manifest.entries().iter().enumerate() {
            hooks.check()?;
            hooks.emit(Event::WritingEntry {
                index,
                path: &entry.path,
                size: entry.size,
            });
            let src_path = safe_join(root, &entry.path)?;
            let mut src = File::open(&src_path)?;
            write_prefix(&mut enc, entry.size).map_err(ModpackError::Compression)?;
            copy_body(&mut src, &mut *enc, entry, &mut buf, hooks)?;
        }
        enc.finish().map_err(ModpackError::Compression)?;
    }
    out.flush()?;
    Ok(out)
}

/// Streams exactly `entry.size` bytes and re-checks the digest, so a file
/// edited after the manifest was built cannot slip into the archive.
fn copy_body(
    src: &mut File,
    enc: &mut dyn Encoder,
    entry: &ManifestEntry,
    buf: &mut [u8],
    hooks: &Hooks,
) -> Result<()> {
    let mut fwd = HashingForward::new(enc, entry.hash_type.hasher()?);
    let mut left = entry.size;
    while left > 0 {
        hooks.check()?;
        let want = left.min(buf.len() as u64) as usize;
        let n = read_some(src, &mut buf[..want])?;
        if n == 0 {
            return Err(ModpackError::structure(format!(
                "{} shrank since the manifest was built",
                entry.path
            )));
        }
        fwd.write_all(&buf[..n])
            .map_err(ModpackError::Compression)?;
        left -= n as u64;
    }
    if read_some(src, &mut buf[..1])? != 0 {
        return Err(ModpackError::structure(format!(
            "{} grew since the manifest was built",
            entry.path
        )));
    }
    let (_, digest, _) = fwd.finish();
    if digest != entry.digest {
        return Err(ModpackError::structure(format!(
            "{} changed since the manifest was built",
            entry.path
        )));
    }
    Ok(())
}

fn read_some(src: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match src.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Writes to a temporary file beside `dest` and renames it into place only
/// once everything succeeded; on failure `dest` is untouched.
pub fn write_archive(
    manifest: &Manifest,
    root: &Path,
    dest: &Path,
    opts: Option<&WriteOptions>,
) -> Result<()> {
    let default_opts = WriteOptions::default();
    let opts = opts.unwrap_or(&default_opts);

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(io::Error::new(
            ErrorKind::NotFound,
            format!("no such directory {}", parent.display()),
        )
        .into());
    }
    if !opts.overwrite && dest.exists() {
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        )
        .into());
    }

    let tmp = tempfile::Builder::new()
        .prefix(".modpack-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    let w = write_archive_to(manifest, root, BufWriter::new(tmp.as_file()), Some(opts))?;
    w.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;

    let persisted = if opts.overwrite {
        tmp.persist(dest)
    } else {
        tmp.persist_noclobber(dest)
    };
    persisted.map_err(|e| ModpackError::Io(e.error))?;

    opts.hooks.emit(Event::ArchivePublished {
        dest,
        entries: manifest.len(),
    });
    Ok(())
}
