use std::collections::HashMap;

use lazy_static::lazy_static;

/// Errors that the `HuffmanDecoder` can return.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum HuffmanDecoderError {
    /// Any padding strictly larger than 7 bits MUST be interpreted as an error
    PaddingTooLarge,
    /// Any padding that does not correspond to the most significant bits of
    /// EOS MUST be interpreted as an error.
    InvalidPadding,
}

/// Direction a Huffman-coded string travels, used to select which static
/// code table a decoder instance draws from. Request-direction and
/// response-direction traffic are compressed against separate code
/// tables in the draft this decoder targets; in practice both tables
/// observed in this codebase's corpus are the single canonical RFC 7541
/// Appendix B table, so both directions currently resolve to the same
/// map. The `Direction` is kept as an explicit, separate concept (rather
/// than collapsing `HuffmanDecoder` to a unit struct) so a second,
/// genuinely distinct table can be plugged in later without touching any
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

/// Decodes Huffman-coded octet strings using a static, per-direction code
/// table. Holds no mutable state of its own; a fresh instance per string
/// (or a long-lived one reused across strings) behaves identically.
pub struct HuffmanDecoder {
    direction: Direction,
}

impl HuffmanDecoder {
    pub fn new(direction: Direction) -> HuffmanDecoder {
        HuffmanDecoder { direction }
    }

    fn code_map(&self) -> &'static HashMap<(u32, u8), u8> {
        match self.direction {
            Direction::Request => &REQUEST_HUFFMAN_CODE_MAP,
            Direction::Response => &RESPONSE_HUFFMAN_CODE_MAP,
        }
    }

    /// Decodes `buf` into a newly allocated `Vec`, treating the entire
    /// buffer as a Huffman-coded octet string and validating the trailing
    /// padding bits per the draft's rules.
    pub fn decode(&self, buf: &[u8]) -> Result<Vec<u8>, HuffmanDecoderError> {
        let map = self.code_map();
        let mut current: u32 = 0;
        let mut current_len: u8 = 0;
        let mut all_true = true;
        let mut result: Vec<u8> = Vec::new();

        for b in BitIterator::new(buf.iter()) {
            current_len += 1;
            current <<= 1;
            if b {
                current |= 1;
            } else {
                all_true = false;
            }

            let key = (current, current_len);
            if let Some(&val) = map.get(&key) {
                result.push(val);
                current = 0;
                current_len = 0;
                all_true = true;
            }
        }

        if current_len > 7 {
            return Err(HuffmanDecoderError::PaddingTooLarge);
        }
        if current_len > 0 && !all_true {
            return Err(HuffmanDecoderError::InvalidPadding);
        }

        Ok(result)
    }
}

/// Iterates the individual bits of a byte iterator, most significant bit
/// first.
struct BitIterator<'a, I: Iterator> {
    buffer_iterator: I,
    current_byte: Option<&'a u8>,
    pos: u8,
}

impl<'a, I: Iterator> BitIterator<'a, I>
where
    I: Iterator<Item = &'a u8>,
{
    pub fn new(iterator: I) -> BitIterator<'a, I> {
        BitIterator::<'a, I> {
            buffer_iterator: iterator,
            current_byte: None,
            pos: 7,
        }
    }
}

impl<'a, I> Iterator for BitIterator<'a, I>
where
    I: Iterator<Item = &'a u8>,
{
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.current_byte.is_none() {
            self.current_byte = self.buffer_iterator.next();
            self.pos = 7;
        }

        let b = *self.current_byte?;

        let is_set = (b & (1 << self.pos)) == (1 << self.pos);
        if self.pos == 0 {
            self.current_byte = None;
        } else {
            self.pos -= 1;
        }

        Some(is_set)
    }
}

// RFC 7541 Appendix B canonical Huffman code table, symbol order 0..=255.
static HUFFMAN_CODE_ARRAY: &[(u32, u8)] = &[
    (0x1ff8, 13),
    (0x7fffd8, 23),
    (0xfffffe2, 28),
    (0xfffffe3, 28),
    (0xfffffe4, 28),
    (0xfffffe5, 28),
    (0xfffffe6, 28),
    (0xfffffe7, 28),
    (0xfffffe8, 28),
    (0xffffea, 24),
    (0x3ffffffc, 30),
    (0xfffffe9, 28),
    (0xfffffea, 28),
    (0x3ffffffd, 30),
    (0xfffffeb, 28),
    (0xfffffec, 28),
    (0xfffffed, 28),
    (0xfffffee, 28),
    (0xfffffef, 28),
    (0xffffff0, 28),
    (0xffffff1, 28),
    (0xffffff2, 28),
    (0x3ffffffe, 30),
    (0xffffff3, 28),
    (0xffffff4, 28),
    (0xffffff5, 28),
    (0xffffff6, 28),
    (0xffffff7, 28),
    (0xffffff8, 28),
    (0xffffff9, 28),
    (0xffffffa, 28),
    (0xffffffb, 28),
    (0x14, 6),
    (0x3f8, 10),
    (0x3f9, 10),
    (0xffa, 12),
    (0x1ff9, 13),
    (0x15, 6),
    (0xf8, 8),
    (0x7fa, 11),
    (0x3fa, 10),
    (0x3fb, 10),
    (0xf9, 8),
    (0x7fb, 11),
    (0xfa, 8),
    (0x16, 6),
    (0x17, 6),
    (0x18, 6),
    (0x0, 5),
    (0x1, 5),
    (0x2, 5),
    (0x19, 6),
    (0x1a, 6),
    (0x1b, 6),
    (0x1c, 6),
    (0x1d, 6),
    (0x1e, 6),
    (0x1f, 6),
    (0x5c, 7),
    (0xfb, 8),
    (0x7ffc, 15),
    (0x20, 6),
    (0xffb, 12),
    (0x3fc, 10),
    (0x1ffa, 13),
    (0x21, 6),
    (0x5d, 7),
    (0x5e, 7),
    (0x5f, 7),
    (0x60, 7),
    (0x61, 7),
    (0x62, 7),
    (0x63, 7),
    (0x64, 7),
    (0x65, 7),
    (0x66, 7),
    (0x67, 7),
    (0x68, 7),
    (0x69, 7),
    (0x6a, 7),
    (0x6b, 7),
    (0x6c, 7),
    (0x6d, 7),
    (0x6e, 7),
    (0x6f, 7),
    (0x70, 7),
    (0x71, 7),
    (0x72, 7),
    (0xfc, 8),
    (0x73, 7),
    (0xfd, 8),
    (0x1ffb, 13),
    (0x7fff0, 19),
    (0x1ffc, 13),
    (0x3ffc, 14),
    (0x22, 6),
    (0x7ffd, 15),
    (0x3, 5),
    (0x23, 6),
    (0x4, 5),
    (0x24, 6),
    (0x5, 5),
    (0x25, 6),
    (0x26, 6),
    (0x27, 6),
    (0x6, 5),
    (0x74, 7),
    (0x75, 7),
    (0x28, 6),
    (0x29, 6),
    (0x2a, 6),
    (0x7, 5),
    (0x2b, 6),
    (0x76, 7),
    (0x2c, 6),
    (0x8, 5),
    (0x9, 5),
    (0x2d, 6),
    (0x77, 7),
    (0x78, 7),
    (0x79, 7),
    (0x7a, 7),
    (0x7b, 7),
    (0x7ffe, 15),
    (0x7fc, 11),
    (0x3ffd, 14),
    (0x1ffd, 13),
    (0xffffffc, 28),
    (0xfffe6, 20),
    (0x3fffd2, 22),
    (0xfffe7, 20),
    (0xfffe8, 20),
    (0x3fffd3, 22),
    (0x3fffd4, 22),
    (0x3fffd5, 22),
    (0x7fffd9, 23),
    (0x3fffd6, 22),
    (0x7fffda, 23),
    (0x7fffdb, 23),
    (0x7fffdc, 23),
    (0x7fffdd, 23),
    (0x7fffde, 23),
    (0xffffeb, 24),
    (0x7fffdf, 23),
    (0xffffec, 24),
    (0xffffed, 24),
    (0x3fffd7, 22),
    (0x7fffe0, 23),
    (0xffffee, 24),
    (0x7fffe1, 23),
    (0x7fffe2, 23),
    (0x7fffe3, 23),
    (0x7fffe4, 23),
    (0x1fffdc, 21),
    (0x3fffd8, 22),
    (0x7fffe5, 23),
    (0x3fffd9, 22),
    (0x7fffe6, 23),
    (0x7fffe7, 23),
    (0xffffef, 24),
    (0x3fffda, 22),
    (0x1fffdd, 21),
    (0xfffe9, 20),
    (0x3fffdb, 22),
    (0x3fffdc, 22),
    (0x7fffe8, 23),
    (0x7fffe9, 23),
    (0x1fffde, 21),
    (0x7fffea, 23),
    (0x3fffdd, 22),
    (0x3fffde, 22),
    (0xfffff0, 24),
    (0x1fffdf, 21),
    (0x3fffdf, 22),
    (0x7fffeb, 23),
    (0x7fffec, 23),
    (0x1fffe0, 21),
    (0x1fffe1, 21),
    (0x3fffe0, 22),
    (0x1fffe2, 21),
    (0x7fffed, 23),
    (0x3fffe1, 22),
    (0x7fffee, 23),
    (0x7fffef, 23),
    (0xfffea, 20),
    (0x3fffe2, 22),
    (0x3fffe3, 22),
    (0x3fffe4, 22),
    (0x7ffff0, 23),
    (0x3fffe5, 22),
    (0x3fffe6, 22),
    (0x7ffff1, 23),
    (0x3ffffe0, 26),
    (0x3ffffe1, 26),
    (0xfffeb, 20),
    (0x7fff1, 19),
    (0x3fffe7, 22),
    (0x7ffff2, 23),
    (0x3fffe8, 22),
    (0x1ffffec, 25),
    (0x3ffffe2, 26),
    (0x3ffffe3, 26),
    (0x3ffffe4, 26),
    (0x7ffffde, 27),
    (0x7ffffdf, 27),
    (0x3ffffe5, 26),
    (0xfffff1, 24),
    (0x1ffffed, 25),
    (0x7fff2, 19),
    (0x1fffe3, 21),
    (0x3ffffe6, 26),
    (0x7ffffe0, 27),
    (0x7ffffe1, 27),
    (0x3ffffe7, 26),
    (0x7ffffe2, 27),
    (0xfffff2, 24),
    (0x1fffe4, 21),
    (0x1fffe5, 21),
    (0x3ffffe8, 26),
    (0x3ffffe9, 26),
    (0xffffffd, 28),
    (0x7ffffe3, 27),
    (0x7ffffe4, 27),
    (0x7ffffe5, 27),
    (0xfffec, 20),
    (0xfffff3, 24),
    (0xfffed, 20),
    (0x1fffe6, 21),
    (0x3fffe9, 22),
    (0x1fffe7, 21),
    (0x1fffe8, 21),
    (0x7ffff3, 23),
    (0x3fffea, 22),
    (0x3fffeb, 22),
    (0x1ffffee, 25),
    (0x1ffffef, 25),
    (0xfffff4, 24),
    (0xfffff5, 24),
    (0x3ffffea, 26),
    (0x7ffff4, 23),
    (0x3ffffeb, 26),
    (0x7ffffe6, 27),
    (0x3ffffec, 26),
    (0x3ffffed, 26),
    (0x7ffffe7, 27),
    (0x7ffffe8, 27),
    (0x7ffffe9, 27),
    (0x7ffffea, 27),
    (0x7ffffeb, 27),
    (0xffffffe, 28),
    (0x7ffffec, 27),
    (0x7ffffed, 27),
    (0x7ffffee, 27),
    (0x7ffffef, 27),
    (0x7fffff0, 27),
    (0x3ffffee, 26),
    (0x3fffffff, 30),
];

fn build_code_map() -> HashMap<(u32, u8), u8> {
    // The last entry is the EOS pseudo-symbol (index 256), which has no
    // 1-byte representation and must never be decoded as a real octet; it
    // is excluded from the map rather than aliased onto some real symbol.
    let symbols = &HUFFMAN_CODE_ARRAY[..256];
    let mut m = HashMap::with_capacity(symbols.len());
    for (symbol, &(code, code_len)) in symbols.iter().enumerate() {
        m.insert((code, code_len), symbol as u8);
    }
    m
}

lazy_static! {
    static ref REQUEST_HUFFMAN_CODE_MAP: HashMap<(u32, u8), u8> = build_code_map();
    static ref RESPONSE_HUFFMAN_CODE_MAP: HashMap<(u32, u8), u8> = build_code_map();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_lowercase_word() {
        // "www.example.com" Huffman-coded, from RFC 7541 C.4.1.
        let encoded: &[u8] = &[
            0xf1, 0xe3, 0xc2, 0xe5, 0xf2, 0x3a, 0x6b, 0xa0, 0xab, 0x90, 0xf4, 0xff,
        ];
        let decoder = HuffmanDecoder::new(Direction::Request);
        let decoded = decoder.decode(encoded).unwrap();
        assert_eq!(decoded, b"www.example.com");
    }

    #[test]
    fn rejects_oversized_padding() {
        let decoder = HuffmanDecoder::new(Direction::Request);
        // 9 continuous 1 bits cannot be valid EOS padding (max 7 bits).
        let err = decoder.decode(&[0xff, 0xff]).unwrap_err();
        assert_eq!(err, HuffmanDecoderError::PaddingTooLarge);
    }

    #[test]
    fn eos_codeword_is_never_a_decoded_symbol() {
        let decoder = HuffmanDecoder::new(Direction::Request);
        // The 30-bit EOS codeword (0x3fffffff) followed by two more set
        // bits; must not decode as any octet, NUL included.
        let err = decoder.decode(&[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(err, HuffmanDecoderError::PaddingTooLarge);
    }
}
