// Copyright 2022 - 2023 Wenmeng See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: tickbh
// -----
// Created Date: 2023/08/22 11:37:23

use std::fmt;

use super::huffman::HuffmanDecoderError;

/// Errors that can occur while decoding the variable-length integer
/// representation used throughout HPACK.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum IntegerDecodingError {
    /// The continuation bytes would make the decoded value overflow a
    /// 32-bit unsigned integer.
    TooManyOctets,
    InvalidPrefix,
}

/// Errors produced while resolving the string codec (currently only the
/// Huffman path can fail; raw octet strings never do).
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum StringDecodingError {
    HuffmanDecoderError(HuffmanDecoderError),
}

/// All ways a header block can be rejected as malformed. Every variant here
/// is fatal: the decoder instance that produced it should be discarded,
/// since its dynamic table and reference set may now be in an undefined
/// relationship to what the peer's encoder believes they are.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum DecompressionError {
    IntegerDecodingError(IntegerDecodingError),
    StringDecodingError(StringDecodingError),
    /// An indexed representation referenced an index past the combined
    /// dynamic+static index space.
    HeaderIndexOutOfBounds,
    /// A literal header name was encoded with length zero.
    EmptyHeaderName,
}

/// Caller error: a request against the decoder that is outside what its
/// configuration allows. Distinct from `DecompressionError`, which
/// reflects malformed wire input instead of API misuse.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum ConfigError {
    /// `DynamicTable::get_entry` (or similar age-rank lookup) called with
    /// an index outside `[1, length()]`.
    IndexOutOfRange,
}

#[derive(PartialEq, Copy, Clone, Debug)]
pub enum HpackError {
    Decompression(DecompressionError),
    Config(ConfigError),
}

impl HpackError {
    #[inline]
    pub fn description_str(&self) -> &'static str {
        match self {
            HpackError::Decompression(DecompressionError::IntegerDecodingError(
                IntegerDecodingError::TooManyOctets,
            )) => "hpack integer too many octets",
            HpackError::Decompression(DecompressionError::IntegerDecodingError(
                IntegerDecodingError::InvalidPrefix,
            )) => "hpack integer invalid prefix",
            HpackError::Decompression(DecompressionError::StringDecodingError(_)) => {
                "hpack huffman decoding error"
            }
            HpackError::Decompression(DecompressionError::HeaderIndexOutOfBounds) => {
                "hpack header index out of bounds"
            }
            HpackError::Decompression(DecompressionError::EmptyHeaderName) => {
                "hpack literal header name is empty"
            }
            HpackError::Config(ConfigError::IndexOutOfRange) => {
                "hpack dynamic table index out of range"
            }
        }
    }
}

impl fmt::Display for HpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description_str())
    }
}

impl From<IntegerDecodingError> for HpackError {
    fn from(e: IntegerDecodingError) -> Self {
        HpackError::Decompression(DecompressionError::IntegerDecodingError(e))
    }
}

impl From<HuffmanDecoderError> for HpackError {
    fn from(e: HuffmanDecoderError) -> Self {
        HpackError::Decompression(DecompressionError::StringDecodingError(
            StringDecodingError::HuffmanDecoderError(e),
        ))
    }
}

pub type HpackResult<T> = Result<T, HpackError>;
