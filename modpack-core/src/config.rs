use crate::codec::Compression;
use crate::error::{ModpackError, Result};
use crate::hash::HashType;
use serde::Deserialize;
use std::path::Path;

/// Pack settings, usually read from a `modpack.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackConfig {
    pub compression: Compression,
    pub hash_type: Option<HashType>,
    pub workers: Option<usize>,
    pub overwrite: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    compression: Option<String>,
    #[serde(default)]
    hash_type: Option<String>,
    #[serde(default)]
    workers: Option<usize>,
    #[serde(default)]
    overwrite: bool,
}

impl PackConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(s).map_err(|e| ModpackError::Config(e.to_string()))?;
        let compression = raw
            .compression
            .as_deref()
            .map(str::parse::<Compression>)
            .transpose()?
            .unwrap_or_default();
        let hash_type = raw
            .hash_type
            .as_deref()
            .map(parse_hash_type)
            .transpose()?;
        if raw.workers == Some(0) {
            return Err(ModpackError::Config("workers must be at least 1".into()));
        }
        Ok(Self {
            compression,
            hash_type,
            workers: raw.workers,
            overwrite: raw.overwrite,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
            .map_err(|e| ModpackError::Config(format!("{}: {e}", path.display())))
    }
}

/// Unknown names surface as a config error at this boundary.
pub fn parse_hash_type(s: &str) -> Result<HashType> {
    s.parse::<HashType>()
        .and_then(HashType::ensure_registered)
        .map_err(|e| match e {
            ModpackError::UnsupportedHashType(m) => {
                ModpackError::Config(format!("unsupported hash type: {m}"))
            }
            other => other,
        })
}
