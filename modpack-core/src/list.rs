use crate::codec::Compression;
use crate::container::manifest::Manifest;
use crate::error::Result;
use crate::hash::HashType;
use crate::read::stream::ContainerReader;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Header fields and manifest of an archive; bodies are never touched.
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    pub compression: Compression,
    pub hash_type: HashType,
    pub manifest: Manifest,
}

pub fn read_manifest_from(src: impl Read) -> Result<ArchiveInfo> {
    let reader = ContainerReader::open(src)?;
    let header = *reader.header();
    Ok(ArchiveInfo {
        compression: header.compression,
        hash_type: header.hash_type,
        manifest: reader.into_manifest(),
    })
}

pub fn read_manifest(archive: &Path) -> Result<ArchiveInfo> {
    let f = File::open(archive)?;
    read_manifest_from(BufReader::new(f))
}
