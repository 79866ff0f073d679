use super::{Digest, StreamHasher};
use xxhash_rust::xxh3::Xxh3;
use xxhash_rust::xxh32::Xxh32;
use xxhash_rust::xxh64::Xxh64;

const SEED: u64 = 0;

pub struct Xxh64Hasher(Xxh64);

impl StreamHasher for Xxh64Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }
    fn finalize(self: Box<Self>) -> Digest {
        Digest::from_bytes(self.0.digest().to_be_bytes())
    }
}

pub struct Xxh32Hasher(Xxh32);

impl StreamHasher for Xxh32Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }
    fn finalize(self: Box<Self>) -> Digest {
        Digest::from_bytes(self.0.digest().to_be_bytes())
    }
}

pub struct Xxh3Hasher(Box<Xxh3>);

impl StreamHasher for Xxh3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }
    fn finalize(self: Box<Self>) -> Digest {
        Digest::from_bytes(self.0.digest().to_be_bytes())
    }
}

pub fn new_xxh64() -> Box<dyn StreamHasher> {
    Box::new(Xxh64Hasher(Xxh64::new(SEED)))
}

pub fn new_xxh32() -> Box<dyn StreamHasher> {
    Box::new(Xxh32Hasher(Xxh32::new(SEED as u32)))
}

// Xxh3 carries a large internal buffer; keep it off the stack.
pub fn new_xxh3() -> Box<dyn StreamHasher> {
    Box::new(Xxh3Hasher(Box::new(Xxh3::new())))
}
