//! Shared test support: a simulated 23LCV chip behind `embedded-hal`
//! handles, plus an independent bitwise CRC-16 reference.
//!
//! The simulator models what the driver relies on: the chip-select bracket
//! (clocking a deselected chip panics), opcode/address/data command parsing,
//! the mode register, and the sequential-mode address counter with its
//! modulo-capacity wraparound. It powers up in byte mode, so a driver that
//! skips the mode-register write is observable: block transfers move only
//! their first byte.

#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::blocking::spi::{Transfer, Write};
use embedded_hal::digital::v2::OutputPin;

/// Array contents at power-up. Battery-backed RAM holds whatever was there
/// before, so the simulator starts with a non-zero pattern.
pub const FILL: u8 = 0xA5;

const OP_READ: u8 = 0x03;
const OP_WRITE: u8 = 0x02;
const OP_RDMR: u8 = 0x05;
const OP_WRMR: u8 = 0x01;

const MODE_BYTE: u8 = 0x00;
const MODE_SEQUENTIAL: u8 = 0x40;

#[derive(Clone, Copy)]
enum Phase {
    /// Waiting for the opcode byte of a fresh transaction.
    Opcode,
    /// Accumulating big-endian address bytes.
    Address { opcode: u8, acc: u32, remaining: usize },
    /// Moving data bytes; `addr` is the internal address counter.
    Data { opcode: u8, addr: u32 },
    /// WRMR seen; the next byte lands in the mode register.
    ModeWrite,
    /// RDMR seen; every further clock repeats the mode register.
    ModeRead,
    /// Transaction complete (byte mode, or mode written); extra clocks are
    /// ignored until chip select rises.
    Drained,
}

/// One simulated 23LCV die.
pub struct Chip {
    mem: Vec<u8>,
    addr_bytes: usize,
    mode: u8,
    selected: bool,
    phase: Phase,
}

impl Chip {
    fn new(size: usize, addr_bytes: usize) -> Rc<RefCell<Chip>> {
        Rc::new(RefCell::new(Chip {
            mem: vec![FILL; size],
            addr_bytes,
            mode: MODE_BYTE,
            selected: false,
            phase: Phase::Opcode,
        }))
    }

    /// Direct array access, bypassing the bus.
    pub fn peek(&self, addr: u32) -> u8 {
        self.mem[addr as usize]
    }

    /// Direct array write, bypassing the bus.
    pub fn poke(&mut self, addr: u32, value: u8) {
        self.mem[addr as usize] = value;
    }

    fn select(&mut self) {
        assert!(!self.selected, "chip select asserted while already asserted");
        self.selected = true;
        self.phase = Phase::Opcode;
    }

    fn deselect(&mut self) {
        self.selected = false;
        self.phase = Phase::Opcode;
    }

    /// Exchanges one byte: consumes MOSI, returns MISO.
    fn clock(&mut self, mosi: u8) -> u8 {
        assert!(self.selected, "byte clocked while chip select is deasserted");
        match self.phase {
            Phase::Opcode => {
                match mosi {
                    OP_READ | OP_WRITE => {
                        self.phase = Phase::Address {
                            opcode: mosi,
                            acc: 0,
                            remaining: self.addr_bytes,
                        };
                    }
                    OP_WRMR => self.phase = Phase::ModeWrite,
                    OP_RDMR => self.phase = Phase::ModeRead,
                    other => panic!("unsupported opcode {:#04x}", other),
                }
                0xFF
            }
            Phase::Address {
                opcode,
                acc,
                remaining,
            } => {
                let acc = (acc << 8) | u32::from(mosi);
                if remaining == 1 {
                    self.phase = Phase::Data {
                        opcode,
                        addr: acc % self.mem.len() as u32,
                    };
                } else {
                    self.phase = Phase::Address {
                        opcode,
                        acc,
                        remaining: remaining - 1,
                    };
                }
                0xFF
            }
            Phase::Data { opcode, addr } => {
                let miso = if opcode == OP_READ {
                    self.mem[addr as usize]
                } else {
                    self.mem[addr as usize] = mosi;
                    0xFF
                };
                match self.mode {
                    MODE_SEQUENTIAL => {
                        self.phase = Phase::Data {
                            opcode,
                            addr: (addr + 1) % self.mem.len() as u32,
                        };
                    }
                    MODE_BYTE => self.phase = Phase::Drained,
                    other => panic!("data clocked in unsupported mode {:#04x}", other),
                }
                miso
            }
            Phase::ModeWrite => {
                self.mode = mosi;
                self.phase = Phase::Drained;
                0xFF
            }
            Phase::ModeRead => self.mode,
            Phase::Drained => 0xFF,
        }
    }
}

/// SPI handle clocking bytes into a shared [`Chip`].
pub struct SimSpi {
    chip: Rc<RefCell<Chip>>,
}

impl Transfer<u8> for SimSpi {
    type Error = Infallible;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Infallible> {
        let mut chip = self.chip.borrow_mut();
        for word in words.iter_mut() {
            *word = chip.clock(*word);
        }
        Ok(words)
    }
}

impl Write<u8> for SimSpi {
    type Error = Infallible;

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        let mut chip = self.chip.borrow_mut();
        for word in words {
            chip.clock(*word);
        }
        Ok(())
    }
}

/// Chip-select handle for the same shared [`Chip`]. Low = selected.
pub struct SimPin {
    chip: Rc<RefCell<Chip>>,
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.chip.borrow_mut().select();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.chip.borrow_mut().deselect();
        Ok(())
    }
}

/// A simulated 23LCV512: 64 KB, two address bytes.
pub fn sim_kbit512() -> (SimSpi, SimPin, Rc<RefCell<Chip>>) {
    wire(Chip::new(0x1_0000, 2))
}

/// A simulated 23LCV1024: 128 KB, three address bytes.
pub fn sim_mbit1() -> (SimSpi, SimPin, Rc<RefCell<Chip>>) {
    wire(Chip::new(0x2_0000, 3))
}

fn wire(chip: Rc<RefCell<Chip>>) -> (SimSpi, SimPin, Rc<RefCell<Chip>>) {
    (
        SimSpi { chip: chip.clone() },
        SimPin { chip: chip.clone() },
        chip,
    )
}

/// Bitwise CRC-16 update, 0xA001 reflected polynomial: the reference the
/// driver's table-driven checksum must agree with byte for byte.
pub fn crc16_update(mut crc: u16, byte: u8) -> u16 {
    crc ^= u16::from(byte);
    for _ in 0..8 {
        crc = if crc & 1 != 0 {
            (crc >> 1) ^ 0xA001
        } else {
            crc >> 1
        };
    }
    crc
}

/// Folds a whole slice through [`crc16_update`], seed 0.
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0, |crc, &byte| crc16_update(crc, byte))
}
