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

//! The fixed, 1-indexed static table of predefined header fields. Entries
//! and their order come from the draft this decoder targets; they are
//! compile-time constants and are never mutated at runtime.

use super::error::{ConfigError, HpackError};

pub static STATIC_TABLE_RAW: &[(&str, &str)] = &[
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

/// Number of entries in the static table.
pub const STATIC_LENGTH: usize = STATIC_TABLE_RAW.len();

/// Returns the `(name, value)` pair at 1-indexed static table position
/// `index`. Out-of-range access is a programmer error, not a decompression
/// failure: callers are expected to have already range-checked `index`
/// against the combined dynamic+static index space before calling.
pub fn get_entry(index: usize) -> Result<(&'static [u8], &'static [u8]), HpackError> {
    if index == 0 || index > STATIC_LENGTH {
        return Err(HpackError::Config(ConfigError::IndexOutOfRange));
    }
    let (name, value) = STATIC_TABLE_RAW[index - 1];
    Ok((name.as_bytes(), value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_entries() {
        assert_eq!(get_entry(1).unwrap(), (&b":authority"[..], &b""[..]));
        assert_eq!(
            get_entry(STATIC_LENGTH).unwrap(),
            (&b"www-authenticate"[..], &b""[..])
        );
    }

    #[test]
    fn out_of_range_is_config_error() {
        assert!(get_entry(0).is_err());
        assert!(get_entry(STATIC_LENGTH + 1).is_err());
    }
}
