use crate::error::{ModpackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

pub mod gzipc;
pub mod store;
pub mod xzc;
pub mod zstdc;

/// Compression strategy applied to the whole container stream.
///
/// | strategy   | format | cost / ratio                       |
/// |------------|--------|------------------------------------|
/// | `store`    | none   | fastest, no size reduction         |
/// | `fast`     | gzip   | low CPU cost, modest reduction     |
/// | `balanced` | zstd   | moderate cost and ratio            |
/// | `strong`   | xz     | highest ratio, highest CPU/time    |
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Store = 0,
    Fast = 1,
    #[default]
    Balanced = 2,
    Strong = 3,
}

impl Compression {
    pub const ALL: [Compression; 4] = [
        Compression::Store,
        Compression::Fast,
        Compression::Balanced,
        Compression::Strong,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Compression::Store => "store",
            Compression::Fast => "fast",
            Compression::Balanced => "balanced",
            Compression::Strong => "strong",
        }
    }

    pub fn codec(self) -> &'static dyn Codec {
        match self {
            Compression::Store => &store::Store,
            Compression::Fast => &gzipc::GzipCodec,
            Compression::Balanced => &zstdc::ZstdCodec,
            Compression::Strong => &xzc::XzCodec,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = ModpackError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| {
                ModpackError::Config(format!(
                    "unknown compression strategy {s:?} (expected store, fast, balanced or strong)"
                ))
            })
    }
}

/// A compressing writer that must be explicitly finished so trailers land.
pub trait Encoder: Write {
    fn finish(self: Box<Self>) -> io::Result<()>;
}

pub trait Codec: Send + Sync {
    fn compression(&self) -> Compression;
    fn encoder<'w>(&self, dst: &'w mut dyn Write) -> io::Result<Box<dyn Encoder + 'w>>;
    fn decoder<'r>(&self, src: Box<dyn Read + 'r>) -> io::Result<Box<dyn Read + 'r>>;
}
