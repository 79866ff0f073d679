//! Content hashing for manifest entries.
//!
//! Every algorithm is reached through [`HashType`], a closed set dispatched
//! through a static table of constructors. The default is xxHash, which is
//! fast but not collision resistant against adversarial input; digests are
//! meant to catch accidental corruption only.

use crate::error::{ModpackError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

#[cfg(feature = "blake3")]
pub mod blake3h;
#[cfg(feature = "sha256")]
pub mod sha2h;
pub mod xxh;

/// Read granularity for every hashing loop.
pub const CHUNK_SIZE: usize = 64 * 1024;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    Xxh64 = 1,
    Xxh32 = 2,
    Xxh3 = 3,
    Blake3 = 16,
    Sha256 = 17,
}

impl HashType {
    pub const ALL: [HashType; 5] = [
        HashType::Xxh64,
        HashType::Xxh32,
        HashType::Xxh3,
        HashType::Blake3,
        HashType::Sha256,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|h| h.id() == id)
            .ok_or_else(|| ModpackError::UnsupportedHashType(format!("id {id}")))
    }

    pub fn name(self) -> &'static str {
        match self {
            HashType::Xxh64 => "xxh64",
            HashType::Xxh32 => "xxh32",
            HashType::Xxh3 => "xxh3",
            HashType::Blake3 => "blake3",
            HashType::Sha256 => "sha256",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashType::Xxh32 => 4,
            HashType::Xxh64 | HashType::Xxh3 => 8,
            HashType::Blake3 | HashType::Sha256 => 32,
        }
    }

    /// Default for the machine this is running on.
    pub fn host_default() -> Self {
        default_hash_type(cfg!(target_pointer_width = "64"))
    }

    /// Fails with `UnsupportedHashType` when the algorithm was compiled out.
    pub fn ensure_registered(self) -> Result<Self> {
        constructor(self).map(|_| self)
    }

    pub fn hasher(self) -> Result<Box<dyn StreamHasher>> {
        constructor(self).map(|new| new())
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashType {
    type Err = ModpackError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|h| h.name() == wanted)
            .ok_or_else(|| ModpackError::UnsupportedHashType(s.to_string()))
    }
}

/// The 32- and 64-bit xxHash variants produce different, non-interchangeable
/// digests; pick the one native to the host word size.
pub fn default_hash_type(host_is_64bit: bool) -> HashType {
    if host_is_64bit {
        HashType::Xxh64
    } else {
        HashType::Xxh32
    }
}

/// Incremental hashing state. Implementations hold no shared state.
pub trait StreamHasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Digest;
}

type Constructor = fn() -> Box<dyn StreamHasher>;

static REGISTRY: &[(HashType, Constructor)] = &[
    (HashType::Xxh64, xxh::new_xxh64),
    (HashType::Xxh32, xxh::new_xxh32),
    (HashType::Xxh3, xxh::new_xxh3),
    #[cfg(feature = "blake3")]
    (HashType::Blake3, blake3h::new_blake3),
    #[cfg(feature = "sha256")]
    (HashType::Sha256, sha2h::new_sha256),
];

fn constructor(hash_type: HashType) -> Result<Constructor> {
    REGISTRY
        .iter()
        .find(|(h, _)| *h == hash_type)
        .map(|(_, new)| *new)
        .ok_or_else(|| {
            ModpackError::UnsupportedHashType(format!("{hash_type} is not compiled in"))
        })
}

/// Digest bytes; rendered and serialized as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s.trim())
            .map(Self)
            .map_err(|e| ModpackError::Config(format!("invalid hex digest: {e}")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Digest plus the byte count consumed to produce it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hashed {
    pub digest: Digest,
    pub size: u64,
}

/// One pass over `reader`: feeds the hasher and counts bytes, so the size
/// reported is exactly what was hashed.
pub fn hash_reader<R: Read + ?Sized>(reader: &mut R, hash_type: HashType) -> Result<Hashed> {
    let mut hasher = hash_type.hasher()?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok(Hashed {
        digest: hasher.finalize(),
        size,
    })
}

pub fn hash<R: Read + ?Sized>(reader: &mut R, hash_type: HashType) -> Result<Digest> {
    hash_reader(reader, hash_type).map(|h| h.digest)
}

pub fn hash_file(path: &Path, hash_type: HashType) -> Result<Hashed> {
    hash_type.ensure_registered()?;
    let mut f = File::open(path)?;
    hash_reader(&mut f, hash_type)
}
