use super::{Digest, StreamHasher};
use sha2::Digest as _;

pub struct Sha256Hasher(sha2::Sha256);

impl StreamHasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }
    fn finalize(self: Box<Self>) -> Digest {
        Digest::from_bytes(self.0.finalize().to_vec())
    }
}

pub fn new_sha256() -> Box<dyn StreamHasher> {
    Box::new(Sha256Hasher(sha2::Sha256::new()))
}
