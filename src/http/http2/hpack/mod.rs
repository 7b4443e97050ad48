pub mod integers;
pub mod entry;
pub mod static_table;
pub mod dynamic_table;
pub mod huffman;
pub mod error;
pub mod decoder;

pub use decoder::{Decoder, HeaderListener, DEFAULT_HEADER_TABLE_SIZE};
pub use dynamic_table::DynamicTable;
pub use entry::{HeaderEntry, OVERHEAD};
pub use error::{ConfigError, DecompressionError, HpackError, HpackResult};
pub use huffman::{Direction, HuffmanDecoder, HuffmanDecoderError};
pub use static_table::STATIC_LENGTH;
