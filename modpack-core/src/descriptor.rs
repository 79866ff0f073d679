//! Which directory and files make up a mod.

use crate::error::{ModpackError, Result};
use crate::hash::HashType;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory inside a mod root holding its metadata.
pub const MOD_DIR: &str = ".mod";
pub const MOD_CONFIG: &str = "mod.json";
pub const ARCHIVE_EXT: &str = "mpk";

#[derive(Debug, Clone)]
pub struct ModDescriptor {
    pub root: PathBuf,
    pub name: String,
    pub version: String,
    pub hash_type: Option<HashType>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// On-disk shape of `.mod/mod.json`; extra keys are ignored.
#[derive(Deserialize)]
struct ModConfigFile {
    name: String,
    version: String,
    #[serde(default)]
    hash_type: Option<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
}

impl ModDescriptor {
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
            version: version.into(),
            hash_type: None,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_hash_type(mut self, hash_type: HashType) -> Self {
        self.hash_type = Some(hash_type);
        self
    }

    pub fn with_include(mut self, glob: impl Into<String>) -> Self {
        self.include.push(glob.into());
        self
    }

    pub fn with_exclude(mut self, glob: impl Into<String>) -> Self {
        self.exclude.push(glob.into());
        self
    }

    /// Loads `<root>/.mod/mod.json`.
    pub fn from_dir(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(ModpackError::NotAMod {
                path: root.to_path_buf(),
            });
        }
        let cfg_path = Self::config_path(root);
        let raw = match fs::read_to_string(&cfg_path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ModpackError::NotAMod {
                    path: root.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let file: ModConfigFile = serde_json::from_str(&raw)
            .map_err(|e| ModpackError::Config(format!("{}: {e}", cfg_path.display())))?;
        let hash_type = file
            .hash_type
            .as_deref()
            .map(str::parse::<HashType>)
            .transpose()?;
        let desc = Self {
            root: root.to_path_buf(),
            name: file.name,
            version: file.version,
            hash_type,
            include: file.include,
            exclude: file.exclude,
        };
        desc.validate()?;
        Ok(desc)
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(MOD_DIR).join(MOD_CONFIG)
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.version.trim().is_empty() {
            return Err(ModpackError::Config("mod version must not be empty".into()));
        }
        if self.version.contains(['/', '\\']) {
            return Err(ModpackError::Config(format!(
                "mod version {:?} contains a path separator",
                self.version
            )));
        }
        self.filter()?;
        Ok(())
    }

    /// Default archive file name, e.g. `my-mod-1.2.0.mpk`.
    pub fn archive_file_name(&self) -> String {
        format!("{}-{}.{ARCHIVE_EXT}", self.name, self.version)
    }

    pub fn filter(&self) -> Result<PathFilter> {
        PathFilter::new(&self.include, &self.exclude)
    }
}

/// 4..=64 chars: a leading ASCII letter, word chars or `-`, and a trailing
/// letter or digit.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = |why: &str| Err(ModpackError::Config(format!("invalid mod name {name:?}: {why}")));
    let len = name.chars().count();
    if !(4..=64).contains(&len) {
        return bad("must be 4 to 64 characters");
    }
    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_alphabetic() {
        return bad("must start with a letter");
    }
    if !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return bad("must end with a letter or digit");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return bad("only letters, digits, '_' and '-' are allowed");
    }
    Ok(())
}

/// Include/exclude globs over forward-slash relative paths.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn allow_all() -> Self {
        Self {
            include: None,
            exclude: None,
        }
    }

    /// Metadata under `.mod/` is always kept.
    pub fn matches(&self, rel: &str) -> bool {
        if rel.starts_with(MOD_DIR) && rel[MOD_DIR.len()..].starts_with('/') {
            return true;
        }
        let included = self.include.as_ref().is_none_or(|g| g.is_match(rel));
        let excluded = self.exclude.as_ref().is_some_and(|g| g.is_match(rel));
        included && !excluded
    }
}

fn compile(globs: &[String]) -> Result<Option<GlobSet>> {
    if globs.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for g in globs {
        b.add(Glob::new(g).map_err(|e| ModpackError::Config(format!("bad glob {g:?}: {e}")))?);
    }
    b.build()
        .map(Some)
        .map_err(|e| ModpackError::Config(format!("bad glob set: {e}")))
}
