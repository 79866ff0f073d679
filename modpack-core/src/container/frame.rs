//! Size prefixes for the manifest block and each file body.

use std::io::{self, ErrorKind, Read, Write};

pub const PREFIX_LEN: usize = 8;

pub fn write_prefix(mut w: impl Write, size: u64) -> io::Result<()> {
    w.write_all(&size.to_le_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Size(u64),
    /// Stream ended exactly on a frame boundary.
    End,
    /// Stream ended inside the prefix.
    Truncated,
}

/// Reads one prefix, telling a clean end of stream apart from a cut one.
pub fn read_prefix(mut r: impl Read) -> io::Result<Prefix> {
    let mut buf = [0u8; PREFIX_LEN];
    let mut got = 0;
    while got < PREFIX_LEN {
        match r.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(match got {
        0 => Prefix::End,
        PREFIX_LEN => Prefix::Size(u64::from_le_bytes(buf)),
        _ => Prefix::Truncated,
    })
}
