use super::{Codec, Compression, Encoder};
use std::io::{self, Read, Write};

pub struct Store;

struct Passthrough<W: Write>(W);

impl<W: Write> Write for Passthrough<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write> Encoder for Passthrough<W> {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.0.flush()
    }
}

impl Codec for Store {
    fn compression(&self) -> Compression {
        Compression::Store
    }

    fn encoder<'w>(&self, dst: &'w mut dyn Write) -> io::Result<Box<dyn Encoder + 'w>> {
        Ok(Box::new(Passthrough(dst)))
    }

    fn decoder<'r>(&self, src: Box<dyn Read + 'r>) -> io::Result<Box<dyn Read + 'r>> {
        Ok(src)
    }
}
