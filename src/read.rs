use crate::{counter::Counter, progress::Progress, ByteCounter};
use std::io::{self, Read};

/// A reader that counts the bytes read through it.
///
/// Wrapping changes nothing about what the inner reader returns: short reads, EOF and errors all
/// pass through untouched, and a failed read leaves the count as it was. The count only ever
/// grows.
#[derive(Debug)]
pub struct Reader<R>
where
    R: Read,
{
    inner: R,
    counter: ByteCounter,
}

impl<R> Reader<R>
where
    R: Read,
{
    /// Returns a new `Reader` counting the bytes read through `inner`, with an unknown total
    /// size.
    pub fn new(inner: R) -> Self {
        Reader {
            inner,
            counter: ByteCounter::new(),
        }
    }

    /// Returns a new `Reader` expected to read `total` bytes.
    ///
    /// The total is a declaration, not a limit: reading past it is not an error, the count just
    /// keeps growing.
    pub fn with_total(inner: R, total: u64) -> Self {
        Reader {
            inner,
            counter: ByteCounter::with_total(total),
        }
    }

    /// Returns a handle to this reader's counter.
    ///
    /// The handle shares the live count, so it can be polled from another thread (or handed to a
    /// [`Ticker`](crate::Ticker)) while the reader is busy.
    pub fn counter(&self) -> ByteCounter {
        self.counter.clone()
    }

    /// Returns a [`Progress`] snapshot of the reader as it is right now.
    pub fn progress(&self) -> Progress {
        self.counter.progress()
    }

    /// Returns a reference to the inner reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns a mutable reference to the inner reader.
    ///
    /// Reading from the inner reader directly bypasses the count.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consumes the `Reader`, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> Read for Reader<R>
where
    R: Read,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let amt = self.inner.read(buf)?;
        self.counter.add(amt as u64);
        Ok(amt)
    }
}

impl<R> Counter for Reader<R>
where
    R: Read,
{
    fn bytes(&self) -> u64 {
        self.counter.bytes()
    }

    fn total(&self) -> Option<u64> {
        self.counter.total()
    }
}
