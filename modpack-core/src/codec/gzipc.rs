use super::{Codec, Compression, Encoder};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{self, Read, Write};

pub struct GzipCodec;

impl<W: Write> Encoder for GzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        GzEncoder::finish(*self).map(drop)
    }
}

impl Codec for GzipCodec {
    fn compression(&self) -> Compression {
        Compression::Fast
    }

    fn encoder<'w>(&self, dst: &'w mut dyn Write) -> io::Result<Box<dyn Encoder + 'w>> {
        Ok(Box::new(GzEncoder::new(dst, flate2::Compression::fast())))
    }

    fn decoder<'r>(&self, src: Box<dyn Read + 'r>) -> io::Result<Box<dyn Read + 'r>> {
        Ok(Box::new(GzDecoder::new(src)))
    }
}
