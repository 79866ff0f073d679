use super::{Codec, Compression, Encoder};
use std::io::{self, Read, Write};

const LEVEL: i32 = 3;

pub struct ZstdCodec;

impl<W: Write> Encoder for zstd::stream::write::Encoder<'static, W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        zstd::stream::write::Encoder::finish(*self).map(drop)
    }
}

impl Codec for ZstdCodec {
    fn compression(&self) -> Compression {
        Compression::Balanced
    }

    fn encoder<'w>(&self, dst: &'w mut dyn Write) -> io::Result<Box<dyn Encoder + 'w>> {
        // Single-threaded so the same input always yields the same bytes.
        let enc = zstd::stream::write::Encoder::new(dst, LEVEL)?;
        Ok(Box::new(enc))
    }

    fn decoder<'r>(&self, src: Box<dyn Read + 'r>) -> io::Result<Box<dyn Read + 'r>> {
        Ok(Box::new(zstd::stream::read::Decoder::new(src)?))
    }
}
