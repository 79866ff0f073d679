use crate::hash::{Digest, StreamHasher};
use std::io::{Result, Write};

/// Write adapter that hashes and counts every byte on its way to `inner`.
pub struct HashingForward<W: Write> {
    inner: W,
    hasher: Box<dyn StreamHasher>,
    pub counted: u64,
}

impl<W: Write> HashingForward<W> {
    pub fn new(inner: W, hasher: Box<dyn StreamHasher>) -> Self {
        Self {
            inner,
            hasher,
            counted: 0,
        }
    }

    pub fn finish(self) -> (W, Digest, u64) {
        (self.inner, self.hasher.finalize(), self.counted)
    }
}

impl<W: Write> Write for HashingForward<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.counted += n as u64;
        Ok(n)
    }
    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{HashType, hash};

    #[test]
    fn forwards_hashes_and_counts() {
        let mut sink = Vec::new();
        let mut fwd = HashingForward::new(&mut sink, HashType::Xxh64.hasher().unwrap());
        fwd.write_all(b"hello ").unwrap();
        fwd.write_all(b"world").unwrap();
        let (_, digest, n) = fwd.finish();
        assert_eq!(n, 11);
        assert_eq!(sink, b"hello world");
        assert_eq!(digest, hash(&mut &b"hello world"[..], HashType::Xxh64).unwrap());
    }
}
