use crate::{counter::Counter, progress::Progress, ByteCounter};
use std::io::{self, Write};

/// A writer that counts the bytes written through it.
///
/// The count reflects what the inner writer accepted: short writes count only the bytes actually
/// taken, and a failed write leaves the count as it was. Flushing is forwarded to the inner
/// writer and never affects the count.
#[derive(Debug)]
pub struct Writer<W>
where
    W: Write,
{
    inner: W,
    counter: ByteCounter,
}

impl<W> Writer<W>
where
    W: Write,
{
    /// Returns a new `Writer` counting the bytes written through `inner`, with an unknown total
    /// size.
    pub fn new(inner: W) -> Self {
        Writer {
            inner,
            counter: ByteCounter::new(),
        }
    }

    /// Returns a new `Writer` expected to write `total` bytes.
    ///
    /// The total is a declaration, not a limit: writing past it is not an error, the count just
    /// keeps growing.
    pub fn with_total(inner: W, total: u64) -> Self {
        Writer {
            inner,
            counter: ByteCounter::with_total(total),
        }
    }

    /// Returns a handle to this writer's counter.
    ///
    /// The handle shares the live count, so it can be polled from another thread (or handed to a
    /// [`Ticker`](crate::Ticker)) while the writer is busy.
    pub fn counter(&self) -> ByteCounter {
        self.counter.clone()
    }

    /// Returns a [`Progress`] snapshot of the writer as it is right now.
    pub fn progress(&self) -> Progress {
        self.counter.progress()
    }

    /// Returns a reference to the inner writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns a mutable reference to the inner writer.
    ///
    /// Writing to the inner writer directly bypasses the count.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consumes the `Writer`, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> Write for Writer<W>
where
    W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let amt = self.inner.write(buf)?;
        self.counter.add(amt as u64);
        Ok(amt)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W> Counter for Writer<W>
where
    W: Write,
{
    fn bytes(&self) -> u64 {
        self.counter.bytes()
    }

    fn total(&self) -> Option<u64> {
        self.counter.total()
    }
}
