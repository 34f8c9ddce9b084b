//! Driver for the B15F lab board, speaking its byte-level request/reply
//! protocol over a USB serial link.
//!
//! A handle is usually obtained by scanning for the board:
//!
//! ```no_run
//! use b15f::DigitalPort;
//!
//! let mut board = b15f::discover()?;
//! board.digital_write(DigitalPort::Port0, 0b1010_0101)?;
//! let sample = board.analog_read(0)?;
//! println!("ADC 0 reads {sample}");
//! # Ok::<(), b15f::B15FError>(())
//! ```
//!
//! Every operation is a blocking request/reply exchange; see [`B15F`] for
//! the full set. The `experimental` feature adds batched reads. The
//! [`testing`] module provides a scripted in-memory port so driver code can
//! be exercised without hardware.

pub mod config;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod testing;

mod board;

#[cfg(feature = "experimental")]
mod batch;

pub use board::{NativePort, B15F};
pub use discovery::{discover, discover_with_timeout, list_ports};
pub use error::{B15FError, Result};
pub use protocol::{AnalogPort, DigitalPort};

#[cfg(feature = "experimental")]
pub use batch::{BatchReading, ReadSelection};
