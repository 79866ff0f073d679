use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "modpackdev: pack and check mod archives", long_about = None)]
pub struct Cli {
    /// Log progress at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a mod directory into an archive
    Pack {
        root: PathBuf,

        /// Output file (defaults to <name>-<version>.mpk)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// store | fast | balanced | strong
        #[arg(long)]
        compression: Option<String>,

        /// xxh64 | xxh32 | xxh3 | blake3 | sha256
        #[arg(long = "hash")]
        hash_type: Option<String>,

        /// Hashing threads
        #[arg(long)]
        workers: Option<usize>,

        /// TOML file with pack settings; flags win over it
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        overwrite: bool,

        /// Mod name, required without .mod/mod.json
        #[arg(long = "name")]
        mod_name: Option<String>,

        /// Mod version, required without .mod/mod.json
        #[arg(long = "version")]
        mod_version: Option<String>,
    },
    /// Recompute every digest; exits non-zero unless intact
    Verify {
        archive: PathBuf,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the manifest without reading bodies
    List { archive: PathBuf },
    /// Verify and unpack into an existing directory
    Extract {
        archive: PathBuf,
        dest: PathBuf,

        #[arg(long)]
        overwrite: bool,
    },
    /// Digest one file
    Hash {
        file: PathBuf,

        #[arg(long = "hash")]
        hash_type: Option<String>,

        /// Hex digest the file must match; exits non-zero otherwise
        #[arg(long)]
        expect: Option<String>,
    },
}
