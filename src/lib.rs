//! Progress reporting for byte streams.
//!
//! headway answers two questions about a long-running transfer while it is still going: how far
//! along is it, and when will it be done. It is built from three small pieces:
//!
//! - [`Reader`] and [`Writer`] wrap any [`std::io::Read`] or [`std::io::Write`] and count the
//!   bytes moving through them, without changing the I/O behaviour in any other way.
//! - [`Progress`] is an immutable snapshot: bytes so far, the expected total if there is one,
//!   and optionally a remaining-time estimate with a wall-clock ETA.
//! - [`Ticker`] samples any [`Counter`] from a background thread at a fixed interval and hands
//!   out snapshots through a blocking iterator, stopping on its own when the count reaches the
//!   total.
//!
//! The pieces are independent. A [`ByteCounter`] can instrument code that never touches the
//! wrappers, and [`Counter`] can be implemented for sources that count something other than
//! stream I/O.
//!
//! # Example
//!
//! Copy a file while another thread reports on it:
//!
//! ```no_run
//! use headway::{Reader, Ticker};
//! use std::{fs::File, io, thread, time::Duration};
//!
//! # fn main() -> anyhow::Result<()> {
//! let file = File::open("large.bin")?;
//! let total = file.metadata()?.len();
//! let mut reader = Reader::with_total(file, total);
//!
//! let ticks = Ticker::new(reader.counter())
//!     .interval(Duration::from_millis(500))
//!     .start()?;
//!
//! let reporter = thread::spawn(move || {
//!     for progress in ticks {
//!         match progress.remaining() {
//!             Some(remaining) => eprintln!("{:?} remaining", remaining),
//!             None => eprintln!("{} bytes so far", progress.bytes()),
//!         }
//!     }
//! });
//!
//! io::copy(&mut reader, &mut io::sink())?;
//! reporter.join().expect("reporter thread panicked");
//! # Ok(())
//! # }
//! ```
//!
//! The ticker finishes the iterator once the copy reaches `total`, so the reporter thread ends
//! on its own. For a transfer of unknown size, keep a [`CancelToken`] and cancel once the copy
//! returns.

mod counter;
mod error;
mod progress;
mod read;
mod ticker;
mod write;

pub use crate::{
    counter::{ByteCounter, Counter},
    error::{HeadwayError, Result},
    progress::Progress,
    read::Reader,
    ticker::{CancelToken, Ticker, Ticks, DEFAULT_TICK_INTERVAL},
    write::Writer,
};
