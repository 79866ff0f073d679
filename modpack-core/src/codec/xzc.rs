use super::{Codec, Compression, Encoder};
use std::io::{self, Read, Write};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

const PRESET: u32 = 9;

pub struct XzCodec;

impl<W: Write> Encoder for XzEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        XzEncoder::finish(*self).map(drop)
    }
}

impl Codec for XzCodec {
    fn compression(&self) -> Compression {
        Compression::Strong
    }

    fn encoder<'w>(&self, dst: &'w mut dyn Write) -> io::Result<Box<dyn Encoder + 'w>> {
        Ok(Box::new(XzEncoder::new(dst, PRESET)))
    }

    fn decoder<'r>(&self, src: Box<dyn Read + 'r>) -> io::Result<Box<dyn Read + 'r>> {
        Ok(Box::new(XzDecoder::new(src)))
    }
}
