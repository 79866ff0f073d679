use crate::codec::Compression;
use crate::error::{ModpackError, Result};
use crate::hash::HashType;
use std::io::{ErrorKind, Read, Write};

pub const MAGIC: &[u8; 6] = b"MODPAK";
pub const VERSION: u16 = 1;
pub const HEADER_LEN: u64 = 10;

/// Uncompressed preamble: tells a reader which decoder and hash to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub version: u16,
    pub compression: Compression,
    pub hash_type: HashType,
}

impl Superblock {
    pub fn new(compression: Compression, hash_type: HashType) -> Self {
        Self {
            version: VERSION,
            compression,
            hash_type,
        }
    }

    pub fn write_to(&self, mut w: impl Write) -> std::io::Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&self.version.to_le_bytes())?;
        w.write_all(&[self.compression.id(), self.hash_type.id()])?;
        Ok(())
    }

    /// Any shortfall or unknown field is reported as `Corrupt`.
    pub fn read_from(mut r: impl Read) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN as usize];
        r.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => ModpackError::corrupt("truncated header"),
            _ => ModpackError::Io(e),
        })?;
        if &buf[..6] != MAGIC {
            return Err(ModpackError::corrupt("bad magic"));
        }
        let version = u16::from_le_bytes([buf[6], buf[7]]);
        if version != VERSION {
            return Err(ModpackError::corrupt(format!(
                "unsupported format version {version}"
            )));
        }
        let compression = Compression::from_id(buf[8])
            .ok_or_else(|| ModpackError::corrupt(format!("unknown compression id {}", buf[8])))?;
        let hash_type = HashType::from_id(buf[9])
            .map_err(|_| ModpackError::corrupt(format!("unknown hash type id {}", buf[9])))?;
        Ok(Self {
            version,
            compression,
            hash_type,
        })
    }
}
