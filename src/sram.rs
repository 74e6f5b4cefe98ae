//! Driver for the 23LCV512/23LCV1024 battery-backed serial SRAM.

use crate::Error;

use bytemuck::Pod;
use crc::{Crc, CRC_16_ARC};
use hal::blocking::spi::{Transfer, Write};
use hal::digital::v2::OutputPin;

/// Checksum algorithm used by [`Nvsram::checksum`]: CRC-16 with the 0xA001
/// reflected polynomial, seed 0, no final XOR.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// The zero stream in [`Nvsram::erase`] is handed to the transport in chunks
/// of this size. The whole erase still runs under a single chip-select
/// bracket.
const ERASE_CHUNK: usize = 256;

#[allow(unused)] // TODO: dual I/O needs a transport abstraction embedded-hal 0.2 lacks
enum Opcode {
    /// Read data from memory, starting at the framed address
    Read = 0x03,
    /// Write data to memory, starting at the framed address
    Write = 0x02,
    /// Enter Dual I/O access. Not supported.
    EnterDualIo = 0x3B,
    /// Reset Dual I/O access. Not supported.
    ResetIo = 0xFF,
    /// Read the 8-bit mode register
    ReadMode = 0x05,
    /// Write the 8-bit mode register
    WriteMode = 0x01,
}

/// Mode-register encodings.
///
/// The driver only ever selects [`Sequential`](OperatingMode::Sequential);
/// the other encodings are what [`Nvsram::read_mode`] may report on a part
/// whose mode register has not been written yet.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Read and write operations transfer exactly one byte
    Byte = 0b0000_0000,
    /// The entire array is accessible; the internal address counter
    /// increments on every data byte and wraps at the end of the array
    Sequential = 0b0100_0000,
    /// Read and write operations are confined to the addressed 32-byte page
    Page = 0b1000_0000,
    /// Reserved encoding (do not select)
    Reserved = 0b1100_0000,
}

/// Capacity variant, fixed for the lifetime of the driver.
///
/// Selects the total array size, the address mask, and the on-wire address
/// width (two or three big-endian bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// 23LCV512: 512 Kbit (64 KB), two address bytes
    Kbit512,
    /// 23LCV1024: 1 Mbit (128 KB), three address bytes
    Mbit1,
}

impl Capacity {
    /// Total number of addressable bytes: 65536 or 131072.
    pub const fn size(self) -> u32 {
        match self {
            Capacity::Kbit512 => 0x1_0000,
            Capacity::Mbit1 => 0x2_0000,
        }
    }

    /// Mask applied to every address before it is framed: `0xFFFF` or
    /// `0x1_FFFF`. Out-of-range addresses wrap instead of failing.
    pub const fn addr_mask(self) -> u32 {
        self.size() - 1
    }

    /// Builds the opcode + address frame for one transaction. The address is
    /// masked, then emitted most-significant byte first.
    fn frame(self, opcode: Opcode, addr: u32) -> ([u8; 4], usize) {
        let addr = addr & self.addr_mask();
        match self {
            Capacity::Kbit512 => ([opcode as u8, (addr >> 8) as u8, addr as u8, 0], 3),
            Capacity::Mbit1 => (
                [
                    opcode as u8,
                    (addr >> 16) as u8,
                    (addr >> 8) as u8,
                    addr as u8,
                ],
                4,
            ),
        }
    }
}

/// Driver for 23LCV-series battery-backed SPI SRAM chips.
///
/// Every operation takes `&mut self` and runs as one blocking chip-select
/// bracket; nothing may interleave on the same bus inside a bracket. If the
/// bus is shared with other devices, arbitration is the caller's job.
///
/// # Type Parameters
///
/// * **`SPI`**: The SPI master the chip is attached to. Taking it by value
///   makes "bus already configured" a precondition of constructing the
///   driver.
/// * **`CS`**: The chip-select line attached to the `\CS` pin of the chip.
///   Driven low for the duration of each transaction.
#[derive(Debug)]
pub struct Nvsram<SPI, CS> {
    spi: SPI,
    cs: CS,
    capacity: Capacity,
}

impl<SPI, CS, S, P> Nvsram<SPI, CS>
where
    SPI: Transfer<u8, Error = S> + Write<u8, Error = S>,
    CS: OutputPin<Error = P>,
{
    /// Creates a driver and immediately puts the device into sequential
    /// mode.
    ///
    /// # Parameters
    ///
    /// * **`spi`**: An SPI master. Must be configured for SPI mode 0 or 3 at
    ///   a clock rate the part supports.
    /// * **`cs`**: The chip-select pin connected to `\CS`. Deasserted (set
    ///   high) right away.
    /// * **`capacity`**: Which 23LCV part is attached.
    pub fn new(spi: SPI, cs: CS, capacity: Capacity) -> Result<Self, Error<S, P>> {
        let mut this = Self::new_deferred(spi, cs, capacity)?;
        this.init()?;
        Ok(this)
    }

    /// Creates a driver without touching the mode register.
    ///
    /// The chip-select pin is deasserted, nothing else happens on the bus.
    /// Useful when several devices share the bus and configuration traffic
    /// has to wait its turn. Call [`init`](Nvsram::init) exactly once before
    /// any other operation.
    pub fn new_deferred(spi: SPI, cs: CS, capacity: Capacity) -> Result<Self, Error<S, P>> {
        let mut this = Nvsram { spi, cs, capacity };
        this.cs.set_high().map_err(Error::Gpio)?;
        Ok(this)
    }

    /// Writes the mode register, selecting sequential addressing.
    ///
    /// Called automatically by [`new`](Nvsram::new). Idempotent: repeating it
    /// re-sends the same mode byte with no adverse effect.
    pub fn init(&mut self) -> Result<(), Error<S, P>> {
        debug!("selecting sequential mode");
        self.command(&[Opcode::WriteMode as u8, OperatingMode::Sequential as u8])
    }

    /// Total byte capacity of the attached part: 65536 or 131072.
    pub fn size(&self) -> u32 {
        self.capacity.size()
    }

    /// The capacity variant selected at construction.
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Reads the raw mode register (RDMR).
    ///
    /// After [`init`](Nvsram::init) this reports
    /// `OperatingMode::Sequential as u8` (`0x40`).
    pub fn read_mode(&mut self) -> Result<u8, Error<S, P>> {
        let mut buf = [0u8];
        self.cs.set_low().map_err(Error::Gpio)?;
        let mut spi_result = self
            .spi
            .write(&[Opcode::ReadMode as u8])
            .map_err(Error::Spi);
        if spi_result.is_ok() {
            spi_result = self.spi.transfer(&mut buf).map(|_| ()).map_err(Error::Spi);
        }
        self.cs.set_high().map_err(Error::Gpio)?;
        spi_result?;
        trace!("mode register = {:#04x}", buf[0]);
        Ok(buf[0])
    }

    /// Reads one byte from `addr`.
    ///
    /// The address is masked to the capacity, so out-of-range addresses wrap.
    pub fn read_byte(&mut self, addr: u32) -> Result<u8, Error<S, P>> {
        let mut buf = [0u8];
        self.read_slice(addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Writes one byte to `addr`, with the same address masking as
    /// [`read_byte`](Nvsram::read_byte).
    pub fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), Error<S, P>> {
        self.write_slice(addr, &[value])
    }

    /// Identical to [`write_byte`](Nvsram::write_byte); there is no
    /// read-compare-skip step. EEPROM-style APIs conventionally offer
    /// `update`; on a RAM part it is a plain write.
    pub fn update_byte(&mut self, addr: u32, value: u8) -> Result<(), Error<S, P>> {
        self.write_byte(addr, value)
    }

    /// Reads `buf.len()` bytes starting at `addr` into `buf`, in a single
    /// chip-select bracket.
    ///
    /// Only the starting address is masked. A transfer running past the end
    /// of the array continues at address 0: that is the device's own
    /// sequential-mode counter wrapping, passed through unvalidated.
    pub fn read_slice(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), Error<S, P>> {
        trace!("read {} bytes @ {:#07x}", buf.len(), addr);
        let (frame, len) = self.capacity.frame(Opcode::Read, addr);

        self.cs.set_low().map_err(Error::Gpio)?;
        let mut spi_result = self.spi.write(&frame[..len]).map_err(Error::Spi);
        if spi_result.is_ok() {
            spi_result = self.spi.transfer(buf).map(|_| ()).map_err(Error::Spi);
        }
        self.cs.set_high().map_err(Error::Gpio)?;
        spi_result
    }

    /// Writes all of `data` starting at `addr`, in a single chip-select
    /// bracket, with the same start-address masking and end-of-array
    /// wrapping as [`read_slice`](Nvsram::read_slice).
    pub fn write_slice(&mut self, addr: u32, data: &[u8]) -> Result<(), Error<S, P>> {
        trace!("write {} bytes @ {:#07x}", data.len(), addr);
        let (frame, len) = self.capacity.frame(Opcode::Write, addr);

        self.cs.set_low().map_err(Error::Gpio)?;
        let mut spi_result = self.spi.write(&frame[..len]).map_err(Error::Spi);
        if spi_result.is_ok() {
            spi_result = self.spi.write(data).map_err(Error::Spi);
        }
        self.cs.set_high().map_err(Error::Gpio)?;
        spi_result
    }

    /// Reads a `T` from `addr` as an opaque byte blob.
    ///
    /// One block read of `size_of::<T>()` bytes; the byte image is whatever
    /// layout `T` has in memory, so persistent values should be `#[repr(C)]`.
    pub fn get<T: Pod>(&mut self, addr: u32) -> Result<T, Error<S, P>> {
        let mut value = T::zeroed();
        self.read_slice(addr, bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Writes `value`'s byte image to `addr` in one block write, the
    /// counterpart of [`get`](Nvsram::get).
    pub fn put<T: Pod>(&mut self, addr: u32, value: &T) -> Result<(), Error<S, P>> {
        self.write_slice(addr, bytemuck::bytes_of(value))
    }

    /// Zeroes the whole array.
    ///
    /// One chip-select bracket: a write to address 0 followed by a stream of
    /// `size()` zero bytes. Costs O(capacity) bus traffic, the slowest
    /// operation here by far.
    pub fn erase(&mut self) -> Result<(), Error<S, P>> {
        debug!("erasing {} bytes", self.capacity.size());
        let (frame, len) = self.capacity.frame(Opcode::Write, 0);

        self.cs.set_low().map_err(Error::Gpio)?;
        let mut spi_result = self.spi.write(&frame[..len]).map_err(Error::Spi);
        let zeroes = [0u8; ERASE_CHUNK];
        let mut remaining = self.capacity.size();
        while spi_result.is_ok() && remaining > 0 {
            let n = remaining.min(ERASE_CHUNK as u32) as usize;
            spi_result = self.spi.write(&zeroes[..n]).map_err(Error::Spi);
            remaining -= n as u32;
        }
        self.cs.set_high().map_err(Error::Gpio)?;
        spi_result
    }

    /// CRC-16 over `len` bytes starting at `addr`, seed 0.
    ///
    /// Issues `len` single-byte read transactions, folding each byte through
    /// the CRC-16 update function (0xA001 reflected polynomial). An empty
    /// range yields 0.
    ///
    /// On [`Capacity::Mbit1`] both `addr` and `len` are masked with
    /// [`addr_mask`](Capacity::addr_mask) before use. On
    /// [`Capacity::Kbit512`] only the per-read addresses are masked: a
    /// length larger than the array folds wrapped bytes in again rather than
    /// being truncated.
    pub fn checksum(&mut self, addr: u32, len: u32) -> Result<u16, Error<S, P>> {
        let mask = self.capacity.addr_mask();
        let (addr, len) = match self.capacity {
            Capacity::Kbit512 => (addr, len),
            Capacity::Mbit1 => (addr & mask, len & mask),
        };
        trace!("checksum over {} bytes @ {:#07x}", len, addr);

        let crc = CRC16;
        let mut digest = crc.digest();
        for i in 0..len {
            let byte = self.read_byte(addr.wrapping_add(i))?;
            digest.update(&[byte]);
        }
        Ok(digest.finalize())
    }

    /// Releases the SPI bus and chip-select pin.
    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    /// Runs one chip-select bracket around a write-only transfer. CS is
    /// released even when the transfer fails.
    fn command(&mut self, bytes: &[u8]) -> Result<(), Error<S, P>> {
        self.cs.set_low().map_err(Error::Gpio)?;
        let spi_result = self.spi.write(bytes).map_err(Error::Spi);
        self.cs.set_high().map_err(Error::Gpio)?;
        spi_result
    }
}
