//! Provides various ways to make your program panic

use std::{fmt, thread::JoinHandle};

/// The message of the panic raised by [`raise_panic`]
pub const PANIC_MESSAGE: &str = "sadness has been raised";

/// The name of the thread spawned by [`panic_on_thread`]
pub const THREAD_NAME: &str = "sad-thread";

/// The different ways a panic can be raised
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SadnessFlavor {
    /// A static string payload, see [`raise_panic`]
    Message,
    /// A formatted `String` payload, see [`raise_formatted_panic`]
    Formatted,
    /// Unwrapping an error with a cause chain, see [`raise_error_chain`]
    ErrorChain,
    /// A payload that isn't a string, see [`raise_non_string_panic`]
    NonString,
    /// Indexing out of bounds, see [`raise_out_of_bounds`]
    OutOfBounds,
}

impl SadnessFlavor {
    pub const ALL: [Self; 5] = [
        Self::Message,
        Self::Formatted,
        Self::ErrorChain,
        Self::NonString,
        Self::OutOfBounds,
    ];

    /// Makes the calling thread sad
    pub fn make_sad(self) -> ! {
        match self {
            Self::Message => raise_panic(),
            Self::Formatted => raise_formatted_panic(42),
            Self::ErrorChain => raise_error_chain(),
            Self::NonString => raise_non_string_panic(),
            Self::OutOfBounds => raise_out_of_bounds(),
        }
    }

    /// A fragment that is expected to appear in the panic message
    pub fn expected_message(self) -> &'static str {
        match self {
            Self::Message => PANIC_MESSAGE,
            Self::Formatted => "sadness level 42",
            Self::ErrorChain => "Load(Read(RootCause))",
            Self::NonString => "Box<dyn Any>",
            Self::OutOfBounds => "index out of bounds",
        }
    }
}

impl fmt::Display for SadnessFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Message => "message",
            Self::Formatted => "formatted",
            Self::ErrorChain => "error-chain",
            Self::NonString => "non-string",
            Self::OutOfBounds => "out-of-bounds",
        })
    }
}

/// Panics with a static string payload
pub fn raise_panic() -> ! {
    panic!("{PANIC_MESSAGE}");
}

/// Panics with a formatted `String` payload
pub fn raise_formatted_panic(level: u32) -> ! {
    panic!("sadness level {level}");
}

/// The inner-most error of [`SadError::chain`]
#[derive(Debug)]
pub struct RootCause;

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the disk is full of sadness")
    }
}

impl std::error::Error for RootCause {}

/// An error with a two level cause chain
#[derive(Debug)]
pub enum SadError {
    Load(Box<SadError>),
    Read(RootCause),
}

impl SadError {
    /// `failed to load level` <- `failed to read level file` <- [`RootCause`]
    pub fn chain() -> Self {
        Self::Load(Box::new(Self::Read(RootCause)))
    }
}

impl fmt::Display for SadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load(_) => "failed to load level",
            Self::Read(_) => "failed to read level file",
        })
    }
}

impl std::error::Error for SadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(inner) => Some(inner.as_ref()),
            Self::Read(inner) => Some(inner),
        }
    }
}

/// Panics by unwrapping a [`SadError::chain`]
pub fn raise_error_chain() -> ! {
    let res: Result<(), SadError> = Err(SadError::chain());
    res.unwrap();
    unreachable!("the error was unwrapped");
}

/// The payload of [`raise_non_string_panic`]
#[derive(Debug)]
pub struct SadnessCode(pub u32);

/// Panics with a payload that isn't a string
pub fn raise_non_string_panic() -> ! {
    std::panic::panic_any(SadnessCode(0xdead));
}

/// Panics by indexing past the end of a slice
pub fn raise_out_of_bounds() -> ! {
    let sadness = [1u8, 2, 3];
    let index = std::hint::black_box(sadness.len() + 1);
    println!("{}", sadness[index]);
    unreachable!("indexed out of bounds");
}

/// Spawns a thread named [`THREAD_NAME`] that is made sad with the specified
/// flavor
pub fn panic_on_thread(flavor: SadnessFlavor) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name(THREAD_NAME.to_owned())
        .spawn(move || flavor.make_sad())
        .expect("failed to spawn sad thread")
}
