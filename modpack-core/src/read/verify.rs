use crate::container::manifest::Manifest;
use crate::error::Result;
use crate::events::{Event, Hooks};
use crate::hash::{Digest, HashType};
use crate::read::stream::{Body, ContainerReader};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Match,
    Mismatch,
    Missing,
    Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryResult {
    pub path: String,
    /// `None` for bodies the manifest does not describe.
    pub expected: Option<Digest>,
    /// `None` when the body never arrived.
    pub actual: Option<Digest>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub name: String,
    pub version: String,
    pub hash_type: HashType,
    pub entries: Vec<EntryResult>,
    /// The container ended before every manifest entry was delivered.
    pub truncated: bool,
}

impl VerificationResult {
    pub fn is_intact(&self) -> bool {
        !self.truncated && self.entries.iter().all(|e| e.outcome == Outcome::Match)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryResult> {
        self.entries.iter().filter(|e| e.outcome != Outcome::Match)
    }
}

#[derive(Clone, Debug, Default)]
pub struct VerifyOptions {
    pub hooks: Hooks,
}

/// Accumulates per-entry outcomes; a bad entry never stops the others.
pub(crate) struct Tally {
    result: VerificationResult,
}

impl Tally {
    pub(crate) fn new(manifest: &Manifest) -> Self {
        Self {
            result: VerificationResult {
                name: manifest.name().to_string(),
                version: manifest.version().to_string(),
                hash_type: manifest.hash_type(),
                entries: Vec::with_capacity(manifest.len()),
                truncated: false,
            },
        }
    }

    /// Returns false once there is nothing more to read.
    pub(crate) fn record(&mut self, manifest: &Manifest, body: Body, hooks: &Hooks) -> bool {
        let entries = manifest.entries();
        match body {
            Body::Entry { index, digest } => {
                let e = &entries[index];
                let outcome = if digest == e.digest {
                    hooks.emit(Event::EntryVerified { path: &e.path });
                    Outcome::Match
                } else {
                    hooks.emit(Event::EntryMismatch {
                        path: &e.path,
                        expected: &e.digest,
                        actual: &digest,
                    });
                    Outcome::Mismatch
                };
                self.result.entries.push(EntryResult {
                    path: e.path.clone(),
                    expected: Some(e.digest.clone()),
                    actual: Some(digest),
                    outcome,
                });
                true
            }
            Body::Missing { index } => {
                self.result.truncated = true;
                for e in &entries[index..] {
                    hooks.emit(Event::EntryMissing { path: &e.path });
                    self.result.entries.push(EntryResult {
                        path: e.path.clone(),
                        expected: Some(e.digest.clone()),
                        actual: None,
                        outcome: Outcome::Missing,
                    });
                }
                false
            }
            Body::Extra {
                frame,
                size,
                digest,
            } => {
                let path = format!("#{frame}");
                hooks.emit(Event::EntryExtra { path: &path, size });
                self.result.entries.push(EntryResult {
                    path,
                    expected: None,
                    actual: Some(digest),
                    outcome: Outcome::Extra,
                });
                true
            }
            Body::End => false,
        }
    }

    pub(crate) fn finish(self) -> VerificationResult {
        self.result
    }
}

/// Recompute every digest in a container read from `src`.
///
/// Structural damage short-circuits with `Corrupt`; per-entry problems are
/// collected in the result. The source is only read.
pub fn verify_reader(src: impl Read, opts: Option<&VerifyOptions>) -> Result<VerificationResult> {
    let default_opts = VerifyOptions::default();
    let hooks = &opts.unwrap_or(&default_opts).hooks;

    let mut reader = ContainerReader::open(src)?;
    let manifest = reader.manifest().clone();
    let mut tally = Tally::new(&manifest);
    let mut sink = io::sink();
    loop {
        hooks.check()?;
        let body = reader.next_body(&mut sink)?;
        if !tally.record(&manifest, body, hooks) {
            break;
        }
    }
    Ok(tally.finish())
}

pub fn verify_archive(path: &Path, opts: Option<&VerifyOptions>) -> Result<VerificationResult> {
    let f = File::open(path)?;
    verify_reader(BufReader::new(f), opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Compression;
    use crate::descriptor::ModDescriptor;
    use crate::error::ModpackError;
    use crate::events::testing::RecordingSink;
    use crate::pack::builder::build_manifest;
    use crate::pack::writer::{WriteOptions, write_archive_to};
    use std::fs;
    use std::sync::Arc;

    fn stored_archive() -> (tempfile::TempDir, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        fs::write(dir.path().join("b/c.txt"), "world").unwrap();
        let desc = ModDescriptor::new(dir.path(), "demo-mod", "1.0.0");
        let m = build_manifest(&desc, None).unwrap();
        let opts = WriteOptions {
            compression: Compression::Store,
            hooks: Hooks::silent(),
            ..Default::default()
        };
        let buf = write_archive_to(&m, dir.path(), Vec::new(), Some(&opts)).unwrap();
        (dir, buf)
    }

    fn quiet() -> VerifyOptions {
        VerifyOptions {
            hooks: Hooks::silent(),
        }
    }

    #[test]
    fn intact_archive() {
        let (_dir, buf) = stored_archive();
        let r = verify_reader(&buf[..], Some(&quiet())).unwrap();
        assert!(r.is_intact());
        assert_eq!(r.count(Outcome::Match), 2);
        assert_eq!(r.name, "demo-mod");
        assert_eq!(r.failures().count(), 0);
    }

    #[test]
    fn one_flipped_byte_fails_one_entry() {
        let (_dir, mut buf) = stored_archive();
        let at = buf.windows(5).rposition(|w| w == b"world").unwrap();
        buf[at] = b'W';
        let sink = Arc::new(RecordingSink::default());
        let opts = VerifyOptions {
            hooks: Hooks::new(sink.clone()),
        };
        let r = verify_reader(&buf[..], Some(&opts)).unwrap();
        assert!(!r.is_intact());
        let bad: Vec<_> = r.failures().collect();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].path, "b/c.txt");
        assert_eq!(bad[0].outcome, Outcome::Mismatch);
        assert_ne!(bad[0].expected, bad[0].actual);
        assert_eq!(r.entries[0].outcome, Outcome::Match);
        assert_eq!(sink.count("EntryMismatch"), 1);
    }

    #[test]
    fn missing_tail_entries() {
        let (_dir, buf) = stored_archive();
        let cut = &buf[..buf.len() - 3];
        let r = verify_reader(cut, Some(&quiet())).unwrap();
        assert!(r.truncated);
        assert!(!r.is_intact());
        assert_eq!(r.count(Outcome::Missing), 1);
        assert_eq!(r.entries[1].actual, None);
    }

    #[test]
    fn cancelled_mid_verify() {
        let (_dir, buf) = stored_archive();
        let opts = quiet();
        opts.hooks.cancel();
        assert!(matches!(
            verify_reader(&buf[..], Some(&opts)),
            Err(ModpackError::Cancelled)
        ));
    }

    #[test]
    fn serializes_outcomes_lowercase() {
        let (_dir, buf) = stored_archive();
        let r = verify_reader(&buf[..], Some(&quiet())).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["entries"][0]["outcome"], "match");
        assert_eq!(json["entries"][0]["path"], "a.txt");
    }
}
