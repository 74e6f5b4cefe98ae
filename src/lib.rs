//! Platform-agnostic driver for the Microchip 23LCV512 and 23LCV1024
//! battery-backed serial SRAM devices, built on the [`embedded-hal`] traits.
//!
//! These parts are plain SPI RAM with an external battery keeping the array
//! alive. They are byte-addressable and need none of the page-erase or
//! write-latency bookkeeping flash parts do. The driver covers single-byte
//! and block access, a full-array erase, and a CRC-16 checksum over an
//! address range.
//!
//! | Device    | Capacity        | Address bytes |
//! |-----------|-----------------|---------------|
//! | 23LCV512  | 512 Kbit, 64 KB | 2             |
//! | 23LCV1024 | 1 Mbit, 128 KB  | 3             |
//!
//! Addresses are masked to the selected capacity before they reach the wire,
//! so out-of-range addresses wrap instead of failing. Block transfers rely on
//! the device's sequential mode: the internal address counter auto-increments
//! and wraps at the end of the array, and the driver passes that behavior
//! through untouched.
//!
//! # Usage
//!
//! ```ignore
//! use nvsram::sram::{Capacity, Nvsram};
//!
//! // `spi` must implement the blocking `Transfer<u8>` + `Write<u8>` traits
//! // and `cs` the `OutputPin` trait, both from `embedded-hal` 0.2.
//! let mut ram = Nvsram::new(spi, cs, Capacity::Mbit1)?;
//!
//! ram.write_byte(0x1234, 0xAB)?;
//! assert_eq!(ram.read_byte(0x1234)?, 0xAB);
//!
//! let crc = ram.checksum(0x1000, 64)?;
//! ```
//!
//! There is no `ram[addr]` indexing sugar: `core::ops::Index` must return a
//! reference, which a bus transaction cannot produce. Use
//! [`sram::Nvsram::read_byte`].
//!
//! Enable the `log` feature to get `trace!`/`debug!` output on bus
//! operations through the [`log`](https://docs.rs/log) facade.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs, unsafe_code)]

extern crate embedded_hal as hal;

#[macro_use]
mod log;
mod error;
pub mod sram;

pub use crate::error::Error;
