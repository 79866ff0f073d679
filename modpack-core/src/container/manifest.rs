use crate::error::{ModpackError, Result};
use crate::hash::{Digest, HashType};
use crate::util::sanitize::is_safe_relative;
use serde::{Deserialize, Serialize};

pub const MANIFEST_FORMAT: u32 = 1;
/// Upper bound accepted when decoding; anything larger is treated as corrupt.
pub const MAX_MANIFEST_LEN: u64 = 64 * 1024 * 1024;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub size: u64,
    pub hash_type: HashType,
    pub digest: Digest,
}

/// Ordered, immutable description of an archive's contents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    format: u32,
    name: String,
    version: String,
    hash_type: HashType,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Sorts entries byte-wise by path and rejects duplicate or unsafe paths.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        hash_type: HashType,
        mut entries: Vec<ManifestEntry>,
    ) -> Result<Self> {
        entries.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));
        let m = Self {
            format: MANIFEST_FORMAT,
            name: name.into(),
            version: version.into(),
            hash_type,
            entries,
        };
        m.check().map_err(ModpackError::InvalidModStructure)?;
        Ok(m)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| ModpackError::Io(std::io::Error::other(e.to_string())))?;
        Ok(buf)
    }

    /// Decodes and re-checks every structural invariant; failures are `Corrupt`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let m: Manifest = ciborium::de::from_reader(bytes)
            .map_err(|e| ModpackError::corrupt(format!("manifest decode: {e}")))?;
        if m.format != MANIFEST_FORMAT {
            return Err(ModpackError::corrupt(format!(
                "unsupported manifest format {}",
                m.format
            )));
        }
        m.check().map_err(ModpackError::Corrupt)?;
        Ok(m)
    }

    fn check(&self) -> std::result::Result<(), String> {
        for e in &self.entries {
            if !is_safe_relative(&e.path) {
                return Err(format!("unsafe entry path {:?}", e.path));
            }
            if e.digest.as_bytes().len() != e.hash_type.digest_len() {
                return Err(format!("digest length does not fit {} for {}", e.hash_type, e.path));
            }
        }
        for w in self.entries.windows(2) {
            match w[0].path.as_bytes().cmp(w[1].path.as_bytes()) {
                std::cmp::Ordering::Less => {}
                std::cmp::Ordering::Equal => {
                    return Err(format!("duplicate entry path {:?}", w[0].path));
                }
                std::cmp::Ordering::Greater => {
                    return Err(format!("entries out of order at {:?}", w[1].path));
                }
            }
        }
        Ok(())
    }
}
