#![forbid(unsafe_code)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod events;

pub mod util {
    pub mod hash_forward;
    pub mod sanitize;
}

pub mod hash;

pub mod codec;

pub mod container {
    pub mod frame;
    pub mod manifest;
    pub mod superblock;
}

pub mod pack {
    pub mod builder;
    pub mod walker;
    pub mod writer;
}

pub mod read {
    pub mod extract;
    pub mod stream;
    pub mod verify;
}

pub mod list;

// Re-exports: stable API surface
pub use codec::Compression;
pub use config::PackConfig;
pub use container::manifest::{Manifest, ManifestEntry};
pub use descriptor::ModDescriptor;
pub use error::{ModpackError, Result};
pub use events::{Event, EventSink, Hooks, NullSink, TracingSink};
pub use hash::{Digest, HashType, Hashed, hash, hash_file, hash_reader};
pub use list::{ArchiveInfo, read_manifest};
pub use pack::builder::{BuildOptions, build_manifest};
pub use pack::writer::{PackOptions, WriteOptions, pack, write_archive, write_archive_to};
pub use read::extract::{ExtractOptions, extract};
pub use read::verify::{
    EntryResult, Outcome, VerificationResult, VerifyOptions, verify_archive, verify_reader,
};
