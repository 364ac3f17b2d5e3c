//! Base-N codec used to build order-preserving filenames.
//!
//! Numbers are written most-significant symbol first with no leading padding,
//! so `encode` and `decode` form a bijection between `u64` values and the
//! canonical (non-zero-prefixed) strings over the alphabet.
//!
//! # Examples
//!
//! ```
//! use imgsort::codec::Codec;
//!
//! let codec = Codec::base36();
//! assert_eq!(codec.encode(0), "0");
//! assert_eq!(codec.encode(35), "z");
//! assert_eq!(codec.encode(36), "10");
//! assert_eq!(codec.decode("10").unwrap(), 36);
//! ```

use serde::{Deserialize, Serialize};

/// Digits then lowercase letters. The canonical alphabet.
const BASE36_SYMBOLS: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Digits, uppercase, then lowercase letters, in ASCII order.
const BASE62_SYMBOLS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Errors produced while decoding a Base-N string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input contained a character outside the alphabet.
    InvalidSymbol {
        /// The offending character.
        symbol: char,
        /// Its character position in the input.
        position: usize,
    },
    /// The input was empty.
    Empty,
    /// The decoded value does not fit in a `u64`.
    Overflow(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::InvalidSymbol { symbol, position } => {
                write!(f, "Invalid symbol '{}' at position {}", symbol, position)
            }
            CodecError::Empty => write!(f, "Cannot decode an empty string"),
            CodecError::Overflow(input) => {
                write!(f, "Value of '{}' does not fit in 64 bits", input)
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Which symbol set a [`Codec`] encodes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Alphabet {
    /// `0-9a-z`, safe on case-insensitive filesystems.
    #[default]
    Base36,
    /// `0-9A-Za-z`. Shorter names, but two names can differ only by case.
    Base62,
}

impl Alphabet {
    fn symbols(self) -> &'static [u8] {
        match self {
            Alphabet::Base36 => BASE36_SYMBOLS.as_bytes(),
            Alphabet::Base62 => BASE62_SYMBOLS.as_bytes(),
        }
    }
}

/// Bijective integer/string conversion over a fixed, ordered alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    symbols: &'static [u8],
}

impl Codec {
    /// Creates a codec for the given alphabet.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            symbols: alphabet.symbols(),
        }
    }

    /// The canonical 36-symbol codec.
    pub fn base36() -> Self {
        Self::new(Alphabet::Base36)
    }

    /// The 62-symbol codec.
    pub fn base62() -> Self {
        Self::new(Alphabet::Base62)
    }

    /// Number of symbols in the alphabet.
    pub fn base(&self) -> u64 {
        self.symbols.len() as u64
    }

    /// The symbol representing zero.
    pub fn zero(&self) -> char {
        self.symbols[0] as char
    }

    /// Encodes `n`, most-significant symbol first.
    pub fn encode(&self, mut n: u64) -> String {
        if n == 0 {
            return self.zero().to_string();
        }

        let base = self.base();
        let mut digits = Vec::new();
        while n > 0 {
            digits.push(self.symbols[(n % base) as usize]);
            n /= base;
        }
        digits.reverse();

        // Every symbol is ASCII.
        digits.into_iter().map(char::from).collect()
    }

    /// Encodes `n` and left-pads with the zero symbol up to `width` symbols.
    ///
    /// Names of equal width sort lexicographically in numeric order, which
    /// unpadded names of different lengths do not ("z" > "10"). Values that
    /// need more than `width` symbols are returned unpadded and longer.
    pub fn encode_padded(&self, n: u64, width: usize) -> String {
        let encoded = self.encode(n);
        if encoded.len() >= width {
            return encoded;
        }
        let mut padded = self.zero().to_string().repeat(width - encoded.len());
        padded.push_str(&encoded);
        padded
    }

    /// Decodes `s`, accumulating `value * base + index` left to right.
    ///
    /// Leading zero symbols are accepted, so `decode` also inverts
    /// [`Codec::encode_padded`].
    pub fn decode(&self, s: &str) -> Result<u64, CodecError> {
        if s.is_empty() {
            return Err(CodecError::Empty);
        }

        let base = self.base();
        let mut value: u64 = 0;
        for (position, symbol) in s.chars().enumerate() {
            let index = self
                .index_of(symbol)
                .ok_or(CodecError::InvalidSymbol { symbol, position })?;
            value = value
                .checked_mul(base)
                .and_then(|v| v.checked_add(index))
                .ok_or_else(|| CodecError::Overflow(s.to_string()))?;
        }
        Ok(value)
    }

    fn index_of(&self, symbol: char) -> Option<u64> {
        if !symbol.is_ascii() {
            return None;
        }
        self.symbols
            .iter()
            .position(|&b| b == symbol as u8)
            .map(|i| i as u64)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::base36()
    }
}
