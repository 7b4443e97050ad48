//! Exposes the struct `Decoder` that decodes an HPACK-encoded header block
//! into a sequence of header fields, delivered one at a time to a
//! listener.
//!
//! Unlike a one-shot decoder, this one is resumable: `decode` may be
//! called any number of times with arbitrarily small fragments of the
//! header block and will pick up exactly where it left off. It also
//! implements the reference-set variant of HPACK, where an indexed
//! header toggles membership in a per-connection set that is re-emitted
//! at the end of every block unless it has already been emitted by some
//! other representation in that block.
//!
//! # Example
//!
//! ```rust
//! use webparse_hpack::http::http2::hpack::{Decoder, Direction};
//!
//! let mut decoder = Decoder::new(Direction::Request, 4096, 4096);
//! let mut headers = Vec::new();
//! decoder.decode(&mut &[0x82u8, 0x84][..], &mut headers).unwrap();
//! assert_eq!(headers, vec![
//!     (b":method".to_vec(), b"GET".to_vec()),
//!     (b":path".to_vec(), b"/".to_vec()),
//! ]);
//! ```

use crate::binary::Buf;
use crate::http::http2::DEFAULT_SETTINGS_HEADER_TABLE_SIZE;

use super::dynamic_table::DynamicTable;
use super::entry::{HeaderEntry, OVERHEAD};
use super::error::{DecompressionError, HpackError, HpackResult};
use super::huffman::{Direction, HuffmanDecoder};
use super::integers::VarintTail;
use super::static_table::{self, STATIC_LENGTH};

pub const DEFAULT_HEADER_TABLE_SIZE: usize = DEFAULT_SETTINGS_HEADER_TABLE_SIZE;

/// Receives header fields as the decoder resolves them. Called
/// synchronously from inside `decode`/`end_header_block`; the borrowed
/// slices are only valid for the duration of the call.
pub trait HeaderListener {
    fn emit_header(&mut self, name: &[u8], value: &[u8]);
}

impl<F> HeaderListener for F
where
    F: FnMut(&[u8], &[u8]),
{
    fn emit_header(&mut self, name: &[u8], value: &[u8]) {
        (self)(name, value)
    }
}

impl HeaderListener for Vec<(Vec<u8>, Vec<u8>)> {
    fn emit_header(&mut self, name: &[u8], value: &[u8]) {
        self.push((name.to_vec(), value.to_vec()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexType {
    None,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadHeaderRepresentation,
    ReadIndexedHeader,
    ReadIndexedHeaderName,
    ReadLiteralHeaderNameLengthPrefix,
    ReadLiteralHeaderNameLength,
    ReadLiteralHeaderName,
    SkipLiteralHeaderName,
    ReadLiteralHeaderValueLengthPrefix,
    ReadLiteralHeaderValueLength,
    ReadLiteralHeaderValue,
    SkipLiteralHeaderValue,
}

/// A resumable HPACK header-block decoder, with a reference-set-backed
/// dynamic table that persists across header blocks on the same
/// connection.
pub struct Decoder {
    dynamic_table: DynamicTable,
    huffman: HuffmanDecoder,
    max_header_size: usize,

    state: State,
    index_type: IndexType,
    varint: VarintTail,

    name_huffman: bool,
    value_huffman: bool,
    name_length: usize,
    value_length: usize,
    skip_length: usize,

    name_buf: Vec<u8>,
    value_buf: Vec<u8>,
    pending_name: Vec<u8>,
    name_available: bool,

    header_size: usize,
}

impl Decoder {
    /// `direction` selects which Huffman code table this decoder's string
    /// codec draws from (request-direction vs. response-direction
    /// traffic use separate tables in the draft this targets).
    /// `max_header_size` bounds the total emitted octets for a single
    /// header block (name + value lengths, summed); `max_header_table_size`
    /// is the dynamic table's byte capacity.
    pub fn new(direction: Direction, max_header_size: usize, max_header_table_size: usize) -> Decoder {
        Decoder {
            dynamic_table: DynamicTable::new(max_header_table_size),
            huffman: HuffmanDecoder::new(direction),
            max_header_size,
            state: State::ReadHeaderRepresentation,
            index_type: IndexType::None,
            varint: VarintTail::new(),
            name_huffman: false,
            value_huffman: false,
            name_length: 0,
            value_length: 0,
            skip_length: 0,
            name_buf: Vec::new(),
            value_buf: Vec::new(),
            pending_name: Vec::new(),
            name_available: true,
            header_size: 0,
        }
    }

    pub fn dynamic_table_size(&self) -> usize {
        self.dynamic_table.size()
    }

    pub fn dynamic_table_length(&self) -> usize {
        self.dynamic_table.length()
    }

    pub fn set_max_header_table_size(&mut self, new_max_size: usize) {
        log::debug!(
            "hpack: resizing dynamic table from {} to {} bytes",
            self.dynamic_table.capacity(),
            new_max_size
        );
        self.dynamic_table.set_capacity(new_max_size);
    }

    /// Feeds `input` to the decoder, invoking `listener` for every header
    /// field it fully resolves. Returns `Ok(())` both when the whole
    /// input was consumed normally and when it was exhausted mid-field;
    /// in the latter case the next call to `decode` resumes exactly
    /// where this one left off. Only a malformed wire encoding produces
    /// an `Err`, at which point this decoder instance should be
    /// discarded.
    pub fn decode<B: Buf>(
        &mut self,
        input: &mut B,
        listener: &mut dyn HeaderListener,
    ) -> HpackResult<()> {
        loop {
            match self.state {
                State::ReadHeaderRepresentation => {
                    let b = match input.get_next() {
                        Some(b) => b,
                        None => return Ok(()),
                    };
                    self.begin_representation(b, listener)?;
                }
                State::ReadIndexedHeader => match self.read_varint(input, 0x7F)? {
                    None => return Ok(()),
                    Some(index) => {
                        self.toggle_index(index, listener)?;
                        self.state = State::ReadHeaderRepresentation;
                    }
                },
                State::ReadIndexedHeaderName => match self.read_varint(input, 0x3F)? {
                    None => return Ok(()),
                    Some(index) => {
                        let name = self.read_name(index)?;
                        self.name_length = name.len();
                        self.pending_name = name;
                        self.name_available = true;
                        self.state = State::ReadLiteralHeaderValueLengthPrefix;
                    }
                },
                State::ReadLiteralHeaderNameLengthPrefix => {
                    let b = match input.get_next() {
                        Some(b) => b,
                        None => return Ok(()),
                    };
                    self.name_huffman = b & 0x80 != 0;
                    let prefix = (b & 0x7F) as u32;
                    if prefix < 0x7F {
                        self.name_length = prefix as usize;
                        self.on_name_length_known()?;
                    } else {
                        self.varint = VarintTail::new();
                        self.state = State::ReadLiteralHeaderNameLength;
                    }
                }
                State::ReadLiteralHeaderNameLength => match self.read_varint(input, 0x7F)? {
                    None => return Ok(()),
                    Some(len) => {
                        self.name_length = len;
                        self.on_name_length_known()?;
                    }
                },
                State::ReadLiteralHeaderName => {
                    while self.name_buf.len() < self.name_length {
                        match input.get_next() {
                            Some(b) => self.name_buf.push(b),
                            None => return Ok(()),
                        }
                    }
                    let raw = std::mem::take(&mut self.name_buf);
                    let name = if self.name_huffman {
                        self.huffman.decode(&raw).map_err(HpackError::from)?
                    } else {
                        raw
                    };
                    self.pending_name = name;
                    self.name_available = true;
                    self.state = State::ReadLiteralHeaderValueLengthPrefix;
                }
                State::SkipLiteralHeaderName => {
                    while self.skip_length > 0 {
                        match input.get_next() {
                            Some(_) => self.skip_length -= 1,
                            None => return Ok(()),
                        }
                    }
                    self.name_available = false;
                    self.state = State::ReadLiteralHeaderValueLengthPrefix;
                }
                State::ReadLiteralHeaderValueLengthPrefix => {
                    let b = match input.get_next() {
                        Some(b) => b,
                        None => return Ok(()),
                    };
                    self.value_huffman = b & 0x80 != 0;
                    let prefix = (b & 0x7F) as u32;
                    if prefix < 0x7F {
                        self.value_length = prefix as usize;
                        self.on_value_length_known();
                    } else {
                        self.varint = VarintTail::new();
                        self.state = State::ReadLiteralHeaderValueLength;
                    }
                }
                State::ReadLiteralHeaderValueLength => match self.read_varint(input, 0x7F)? {
                    None => return Ok(()),
                    Some(len) => {
                        self.value_length = len;
                        self.on_value_length_known();
                    }
                },
                State::ReadLiteralHeaderValue => {
                    while self.value_buf.len() < self.value_length {
                        match input.get_next() {
                            Some(b) => self.value_buf.push(b),
                            None => return Ok(()),
                        }
                    }
                    let raw = std::mem::take(&mut self.value_buf);
                    let value = if self.value_huffman {
                        self.huffman.decode(&raw).map_err(HpackError::from)?
                    } else {
                        raw
                    };
                    let name = std::mem::take(&mut self.pending_name);
                    self.insert_header(name, value, self.index_type, listener);
                    self.finish_field();
                }
                State::SkipLiteralHeaderValue => {
                    while self.skip_length > 0 {
                        match input.get_next() {
                            Some(_) => self.skip_length -= 1,
                            None => return Ok(()),
                        }
                    }
                    self.finish_field();
                }
            }
        }
    }

    /// Emits any reference-set entries not already emitted during this
    /// block, resets per-block bookkeeping, and reports whether any
    /// header was dropped or truncated because of `max_header_size`.
    pub fn end_header_block(&mut self, listener: &mut dyn HeaderListener) -> bool {
        for rank in 1..=self.dynamic_table.length() {
            let emit = {
                let entry = self.dynamic_table.get_entry(rank).unwrap();
                entry.in_reference_set && !entry.emitted_this_block
            };
            if emit {
                let (name, value) = {
                    let entry = self.dynamic_table.get_entry(rank).unwrap();
                    (entry.name().to_vec(), entry.value().to_vec())
                };
                self.emit_header(&name, &value, listener);
            }
        }
        for rank in 1..=self.dynamic_table.length() {
            if let Some(entry) = self.dynamic_table.get_entry_mut(rank) {
                entry.emitted_this_block = false;
            }
        }

        let truncated = self.header_size > self.max_header_size;
        log::trace!("hpack: end_header_block truncated={}", truncated);
        self.header_size = 0;
        self.state = State::ReadHeaderRepresentation;
        self.index_type = IndexType::None;
        self.pending_name.clear();
        self.name_available = true;
        truncated
    }

    fn begin_representation(
        &mut self,
        b: u8,
        listener: &mut dyn HeaderListener,
    ) -> HpackResult<()> {
        if b & 0x80 != 0 {
            let i = (b & 0x7F) as usize;
            if i == 0 {
                self.clear_reference_set();
            } else if i == 0x7F {
                self.varint = VarintTail::new();
                self.state = State::ReadIndexedHeader;
            } else {
                self.toggle_index(i, listener)?;
            }
        } else {
            self.index_type = if b & 0x40 != 0 {
                IndexType::None
            } else {
                IndexType::Incremental
            };
            let i = (b & 0x3F) as usize;
            if i == 0 {
                self.state = State::ReadLiteralHeaderNameLengthPrefix;
            } else if i == 0x3F {
                self.varint = VarintTail::new();
                self.state = State::ReadIndexedHeaderName;
            } else {
                let name = self.read_name(i)?;
                self.name_length = name.len();
                self.pending_name = name;
                self.name_available = true;
                self.state = State::ReadLiteralHeaderValueLengthPrefix;
            }
        }
        Ok(())
    }

    fn read_varint<B: Buf>(&mut self, input: &mut B, prefix: u32) -> HpackResult<Option<usize>> {
        loop {
            let b = match input.get_next() {
                Some(b) => b,
                None => return Ok(None),
            };
            if let Some(total) = self.varint.push(prefix, b)? {
                self.varint = VarintTail::new();
                return Ok(Some(total as usize));
            }
        }
    }

    fn on_name_length_known(&mut self) -> HpackResult<()> {
        if self.name_length == 0 {
            return Err(HpackError::Decompression(DecompressionError::EmptyHeaderName));
        }
        self.name_buf = Vec::with_capacity(self.name_length);
        if self.projected_size_exceeds(self.name_length) {
            self.header_size = self.max_header_size + 1;
            match self.index_type {
                IndexType::None => {
                    self.skip_length = self.name_length;
                    self.state = State::SkipLiteralHeaderName;
                }
                IndexType::Incremental => {
                    if self.name_length + OVERHEAD > self.dynamic_table.capacity() {
                        log::debug!("hpack: literal name unindexable, clearing dynamic table");
                        self.dynamic_table.clear();
                        self.skip_length = self.name_length;
                        self.state = State::SkipLiteralHeaderName;
                    } else {
                        self.state = State::ReadLiteralHeaderName;
                    }
                }
            }
        } else {
            self.state = State::ReadLiteralHeaderName;
        }
        Ok(())
    }

    fn on_value_length_known(&mut self) {
        if !self.name_available {
            self.skip_length = self.value_length;
            self.state = State::SkipLiteralHeaderValue;
            return;
        }
        if self.projected_size_exceeds(self.name_length + self.value_length) {
            self.header_size = self.max_header_size + 1;
            match self.index_type {
                IndexType::None => {
                    self.skip_length = self.value_length;
                    self.state = State::SkipLiteralHeaderValue;
                }
                IndexType::Incremental => {
                    if self.name_length + self.value_length + OVERHEAD > self.dynamic_table.capacity()
                    {
                        log::debug!("hpack: literal value unindexable, clearing dynamic table");
                        self.dynamic_table.clear();
                        self.skip_length = self.value_length;
                        self.state = State::SkipLiteralHeaderValue;
                    } else {
                        self.value_buf = Vec::with_capacity(self.value_length);
                        self.state = State::ReadLiteralHeaderValue;
                    }
                }
            }
        } else {
            self.value_buf = Vec::with_capacity(self.value_length);
            self.state = State::ReadLiteralHeaderValue;
        }
    }

    fn finish_field(&mut self) {
        self.pending_name.clear();
        self.name_available = true;
        self.state = State::ReadHeaderRepresentation;
    }

    fn projected_size_exceeds(&self, additional: usize) -> bool {
        self.header_size.saturating_add(additional) > self.max_header_size
    }

    /// Resolves a literal's indexed name, from either table.
    fn read_name(&self, index: usize) -> HpackResult<Vec<u8>> {
        let count = self.dynamic_table.length();
        if index >= 1 && index <= count {
            Ok(self.dynamic_table.get_entry(index).unwrap().name().to_vec())
        } else if index > count && index <= count + STATIC_LENGTH {
            let (name, _) = static_table::get_entry(index - count)
                .map_err(|_| HpackError::Decompression(DecompressionError::HeaderIndexOutOfBounds))?;
            Ok(name.to_vec())
        } else {
            Err(HpackError::Decompression(DecompressionError::HeaderIndexOutOfBounds))
        }
    }

    /// Toggles reference-set membership for a dynamic entry, or, for a
    /// static entry, always inserts a fresh copy into the dynamic table
    /// (static entries themselves are never mutated or referenced
    /// directly).
    fn toggle_index(&mut self, index: usize, listener: &mut dyn HeaderListener) -> HpackResult<()> {
        let count = self.dynamic_table.length();
        if index >= 1 && index <= count {
            let in_reference_set = self.dynamic_table.get_entry(index).unwrap().in_reference_set;
            if in_reference_set {
                self.dynamic_table.get_entry_mut(index).unwrap().in_reference_set = false;
            } else {
                let (name, value) = {
                    let entry = self.dynamic_table.get_entry(index).unwrap();
                    (entry.name().to_vec(), entry.value().to_vec())
                };
                {
                    let entry = self.dynamic_table.get_entry_mut(index).unwrap();
                    entry.in_reference_set = true;
                    entry.emitted_this_block = true;
                }
                self.emit_header(&name, &value, listener);
            }
            Ok(())
        } else if index > count && index <= count + STATIC_LENGTH {
            let (name, value) = static_table::get_entry(index - count)
                .map_err(|_| HpackError::Decompression(DecompressionError::HeaderIndexOutOfBounds))?;
            self.insert_header(name.to_vec(), value.to_vec(), IndexType::Incremental, listener);
            Ok(())
        } else {
            Err(HpackError::Decompression(DecompressionError::HeaderIndexOutOfBounds))
        }
    }

    fn clear_reference_set(&mut self) {
        log::trace!("hpack: clearing reference set");
        for rank in 1..=self.dynamic_table.length() {
            if let Some(entry) = self.dynamic_table.get_entry_mut(rank) {
                entry.in_reference_set = false;
            }
        }
    }

    /// Delivers a header to the listener, subject to `max_header_size`.
    /// An over-budget header is silently dropped; the running total is
    /// pinned one past the limit so `end_header_block` can report it.
    fn emit_header(&mut self, name: &[u8], value: &[u8], listener: &mut dyn HeaderListener) {
        if self.header_size + name.len() + value.len() <= self.max_header_size {
            listener.emit_header(name, value);
            self.header_size += name.len() + value.len();
        } else {
            self.header_size = self.max_header_size + 1;
        }
    }

    /// Emits `(name, value)` and, if `index_type` calls for it, inserts a
    /// fresh entry into the dynamic table marked as already in the
    /// reference set and already emitted this block.
    fn insert_header(
        &mut self,
        name: Vec<u8>,
        value: Vec<u8>,
        index_type: IndexType,
        listener: &mut dyn HeaderListener,
    ) {
        self.emit_header(&name, &value, listener);
        if index_type == IndexType::Incremental {
            let mut entry = HeaderEntry::new(name, value);
            entry.in_reference_set = true;
            entry.emitted_this_block = true;
            self.dynamic_table.add(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(decoder: &mut Decoder, input: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut headers = Vec::new();
        let mut slice = input;
        decoder.decode(&mut slice, &mut headers).unwrap();
        headers
    }

    #[test]
    fn indexed_from_static_table() {
        let mut decoder = Decoder::new(Direction::Request, 4096, 4096);
        let headers = decode_all(&mut decoder, &[0x82]);
        assert_eq!(headers, vec![(b":method".to_vec(), b"GET".to_vec())]);
        assert_eq!(decoder.dynamic_table_length(), 1);

        let mut tail = Vec::new();
        let truncated = decoder.end_header_block(&mut tail);
        assert!(tail.is_empty());
        assert!(!truncated);
    }

    #[test]
    fn reference_set_clear_emits_nothing_after() {
        let mut decoder = Decoder::new(Direction::Request, 4096, 4096);
        decode_all(&mut decoder, &[0x82]);
        // Clear the whole reference set.
        let headers = decode_all(&mut decoder, &[0x80]);
        assert!(headers.is_empty());

        let mut tail = Vec::new();
        decoder.end_header_block(&mut tail);
        assert!(tail.is_empty());
    }

    #[test]
    fn literal_with_incremental_indexing_literal_name_and_value() {
        let mut decoder = Decoder::new(Direction::Request, 4096, 4096);
        // 0x00 (incremental, literal name), name "foo" raw, value "bar" raw.
        let input = [0x00u8, 3, b'f', b'o', b'o', 3, b'b', b'a', b'r'];
        let headers = decode_all(&mut decoder, &input);
        assert_eq!(headers, vec![(b"foo".to_vec(), b"bar".to_vec())]);
        assert_eq!(decoder.dynamic_table_size(), 3 + 3 + OVERHEAD);
    }

    #[test]
    fn chunked_varint_matches_single_chunk() {
        let mut decoder_chunked = Decoder::new(Direction::Request, 4096, 4096);
        let mut decoder_whole = Decoder::new(Direction::Request, 4096, 4096);
        // literal without indexing, name length encoded as continuation (7F 05) = 132
        let name: Vec<u8> = (0..132).map(|_| b'a').collect();
        let mut input = vec![0x40u8, 0x7F, 0x05];
        input.extend_from_slice(&name);
        input.push(1);
        input.push(b'v');

        let whole = decode_all(&mut decoder_whole, &input);

        let mut headers = Vec::new();
        for chunk in input.chunks(1) {
            let mut slice = chunk;
            decoder_chunked.decode(&mut slice, &mut headers).unwrap();
        }
        assert_eq!(headers, whole);
    }

    #[test]
    fn oversized_value_without_indexing_is_dropped_and_reported() {
        let mut decoder = Decoder::new(Direction::Request, 16, 4096);
        // Literal without indexing, literal name "foo", then a value whose
        // length (273) is encoded with a continuation: 0x7F escape, then
        // 0x92 0x01 (18 + 128 = 146, plus the 127 prefix = 273).
        let mut input = vec![0x40u8, 3, b'f', b'o', b'o', 0x7F, 0x92, 0x01];
        input.extend((0..273).map(|_| b'x'));

        let headers = decode_all(&mut decoder, &input);
        assert!(headers.is_empty());

        let mut tail = Vec::new();
        let truncated = decoder.end_header_block(&mut tail);
        assert!(truncated);
    }

    #[test]
    fn eviction_cascade_via_literal_inserts() {
        let mut decoder = Decoder::new(Direction::Request, 4096, 100);
        for _ in 0..3 {
            decode_all(&mut decoder, &[0x00u8, 1, b'k', 1, b'v']);
        }
        assert_eq!(decoder.dynamic_table_length(), 2);
    }
}
