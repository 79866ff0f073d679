use super::{Digest, StreamHasher};

pub struct Blake3Hasher(blake3::Hasher);

impl StreamHasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }
    fn finalize(self: Box<Self>) -> Digest {
        Digest::from_bytes(*self.0.finalize().as_bytes())
    }
}

pub fn new_blake3() -> Box<dyn StreamHasher> {
    Box::new(Blake3Hasher(blake3::Hasher::new()))
}
