pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use modpack_core::error::Result;
use std::process::ExitCode;

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Pack {
            root,
            out,
            compression,
            hash_type,
            workers,
            config,
            overwrite,
            mod_name,
            mod_version,
        } => handlers::handle_pack(handlers::PackArgs {
            root,
            out,
            compression,
            hash_type,
            workers,
            config,
            overwrite,
            mod_name,
            mod_version,
        }),
        Commands::Verify { archive, json } => handlers::handle_verify(archive, json),
        Commands::List { archive } => handlers::handle_list(archive),
        Commands::Extract {
            archive,
            dest,
            overwrite,
        } => handlers::handle_extract(archive, dest, overwrite),
        Commands::Hash {
            file,
            hash_type,
            expect,
        } => handlers::handle_hash(file, hash_type, expect),
    }
}
