use crate::container::frame::{Prefix, read_prefix};
use crate::container::manifest::{MAX_MANIFEST_LEN, Manifest, ManifestEntry};
use crate::container::superblock::Superblock;
use crate::error::{ModpackError, Result};
use crate::hash::{CHUNK_SIZE, Digest, HashType};
use crate::util::hash_forward::HashingForward;
use std::collections::BTreeSet;
use std::io::{self, ErrorKind, Read, Write};

/// Where a [`ContainerReader`] is in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Unopened,
    HeaderRead,
    ManifestRead,
    /// Next body belongs to this frame index.
    Verifying(usize),
    Done,
    Corrupt,
}

/// What one call to [`ContainerReader::next_body`] delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Manifest entry `index` was streamed in full.
    Entry { index: usize, digest: Digest },
    /// The stream ended before entry `index`; it and all later entries are undelivered.
    Missing { index: usize },
    /// A frame past the last manifest entry.
    Extra { frame: usize, size: u64, digest: Digest },
    End,
}

/// Forward-only reader over a container: header, manifest, then bodies.
pub struct ContainerReader<'r> {
    header: Superblock,
    manifest: Manifest,
    stream: Box<dyn Read + 'r>,
    state: ReadState,
    buf: Vec<u8>,
}

impl<'r> ContainerReader<'r> {
    /// Reads the header and manifest. Structural problems are `Corrupt`.
    pub fn open(src: impl Read + 'r) -> Result<Self> {
        let mut src = src;
        let mut state = ReadState::Unopened;
        let header = Superblock::read_from(&mut src)?;
        state = advance(state, ReadState::HeaderRead);

        let mut stream = header
            .compression
            .codec()
            .decoder(Box::new(src))
            .map_err(ModpackError::Compression)?;

        let len = match read_prefix(&mut stream).map_err(|e| classify(e, "manifest"))? {
            Prefix::Size(n) => n,
            Prefix::End | Prefix::Truncated => {
                return Err(ModpackError::corrupt("truncated manifest"));
            }
        };
        if len > MAX_MANIFEST_LEN {
            return Err(ModpackError::corrupt(format!(
                "manifest length {len} exceeds limit"
            )));
        }
        let mut man_bytes = vec![0u8; len as usize];
        stream
            .read_exact(&mut man_bytes)
            .map_err(|e| classify(e, "manifest"))?;
        let manifest = Manifest::from_bytes(&man_bytes)?;
        if manifest.hash_type() != header.hash_type {
            return Err(ModpackError::corrupt(format!(
                "header says {} but manifest says {}",
                header.hash_type,
                manifest.hash_type()
            )));
        }
        let used: BTreeSet<HashType> = manifest.entries().iter().map(|e| e.hash_type).collect();
        for h in used {
            h.ensure_registered()?;
        }
        state = advance(state, ReadState::ManifestRead);

        Ok(Self {
            header,
            manifest,
            stream,
            state,
            buf: vec![0u8; CHUNK_SIZE],
        })
    }

    pub fn header(&self) -> &Superblock {
        &self.header
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn into_manifest(self) -> Manifest {
        self.manifest
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Entry the next body will be checked against, if any remain.
    pub fn pending_entry(&self) -> Option<&ManifestEntry> {
        match self.state {
            ReadState::ManifestRead => self.manifest.entries().first(),
            ReadState::Verifying(i) => self.manifest.entries().get(i),
            _ => None,
        }
    }

    /// Streams the next body into `out`, hashing it on the way.
    ///
    /// A size prefix that disagrees with the manifest, undecodable bytes, or a
    /// torn frame after the last entry move the reader to `Corrupt` and fail.
    pub fn next_body(&mut self, out: &mut dyn Write) -> Result<Body> {
        let index = match self.state {
            ReadState::ManifestRead => 0,
            ReadState::Verifying(i) => i,
            ReadState::Done => return Ok(Body::End),
            ReadState::Corrupt => {
                return Err(ModpackError::corrupt("reader already hit a corrupt frame"));
            }
            ReadState::Unopened | ReadState::HeaderRead => {
                return Err(ModpackError::corrupt("manifest not read"));
            }
        };
        self.state = ReadState::Verifying(index);
        let res = self.read_frame(index, out);
        match &res {
            Ok(Body::Entry { .. }) | Ok(Body::Extra { .. }) => {
                self.state = ReadState::Verifying(index + 1);
            }
            Ok(Body::Missing { .. }) | Ok(Body::End) => self.state = ReadState::Done,
            Err(ModpackError::Corrupt(_)) => self.state = ReadState::Corrupt,
            Err(_) => {}
        }
        res
    }

    fn read_frame(&mut self, index: usize, out: &mut dyn Write) -> Result<Body> {
        let entry = self.manifest.entries().get(index);
        let prefix = match read_prefix(&mut self.stream) {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Prefix::Truncated,
            Err(e) => return Err(classify(e, "frame prefix")),
        };

        let Some(entry) = entry else {
            // Past the manifest: anything but a clean end is another frame or junk.
            return match prefix {
                Prefix::End => Ok(Body::End),
                Prefix::Truncated => Err(ModpackError::corrupt("torn frame after last entry")),
                Prefix::Size(size) => {
                    let hash_type = self.manifest.hash_type();
                    match self.stream_body(size, hash_type, out)? {
                        Some(digest) => Ok(Body::Extra {
                            frame: index,
                            size,
                            digest,
                        }),
                        None => Err(ModpackError::corrupt("torn frame after last entry")),
                    }
                }
            };
        };

        let size = match prefix {
            Prefix::End | Prefix::Truncated => return Ok(Body::Missing { index }),
            Prefix::Size(size) => size,
        };
        if size != entry.size {
            return Err(ModpackError::corrupt(format!(
                "size prefix {size} for {} disagrees with manifest size {}",
                entry.path, entry.size
            )));
        }
        let hash_type = entry.hash_type;
        Ok(match self.stream_body(size, hash_type, out)? {
            Some(digest) => Body::Entry { index, digest },
            None => Body::Missing { index },
        })
    }

    /// `None` when the stream ends before `size` bytes arrive.
    fn stream_body(
        &mut self,
        size: u64,
        hash_type: HashType,
        out: &mut dyn Write,
    ) -> Result<Option<Digest>> {
        let mut fwd = HashingForward::new(out, hash_type.hasher()?);
        let mut left = size;
        while left > 0 {
            let want = left.min(self.buf.len() as u64) as usize;
            let n = match self.stream.read(&mut self.buf[..want]) {
                Ok(0) => return Ok(None),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(classify(e, "body")),
            };
            fwd.write_all(&self.buf[..n])?;
            left -= n as u64;
        }
        let (_, digest, _) = fwd.finish();
        Ok(Some(digest))
    }
}

fn advance(from: ReadState, to: ReadState) -> ReadState {
    debug_assert!(matches!(
        (from, to),
        (ReadState::Unopened, ReadState::HeaderRead)
            | (ReadState::HeaderRead, ReadState::ManifestRead)
    ));
    to
}

/// Decoder failures and short reads inside the container are structural;
/// anything else is a real I/O error and passes through unchanged.
fn classify(e: io::Error, what: &str) -> ModpackError {
    match e.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::InvalidData
        | ErrorKind::InvalidInput
        | ErrorKind::Other => ModpackError::corrupt(format!("{what}: {e}")),
        _ => ModpackError::Io(e),
    }
}
