use core::fmt::{self, Debug, Display};

mod private {
    #[derive(Debug)]
    pub enum Private {}
}

/// The error type used by this library.
///
/// This wraps the transport's own error types. The device itself offers
/// nothing to detect (no status flags, no busy bit), so there are no
/// protocol-level variants. `S` is the SPI bus error type, `P` the
/// chip-select pin error type.
pub enum Error<S, P> {
    /// An SPI transfer failed.
    Spi(S),

    /// The chip-select line could not be set.
    Gpio(P),

    #[doc(hidden)]
    __NonExhaustive(private::Private),
}

impl<S, P> Debug for Error<S, P>
where
    S: Debug,
    P: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(spi) => write!(f, "Error::Spi({:?})", spi),
            Error::Gpio(gpio) => write!(f, "Error::Gpio({:?})", gpio),
            Error::__NonExhaustive(_) => unreachable!(),
        }
    }
}

impl<S, P> Display for Error<S, P>
where
    S: Display,
    P: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(spi) => write!(f, "SPI error: {}", spi),
            Error::Gpio(gpio) => write!(f, "GPIO error: {}", gpio),
            Error::__NonExhaustive(_) => unreachable!(),
        }
    }
}
