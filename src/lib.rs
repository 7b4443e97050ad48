pub mod binary;
pub mod http;
mod error;

pub use binary::Buf;

pub use http::http2::Http2Error;
pub use http::http2::hpack;
pub use http::http2::hpack::{Decoder as HpackDecoder, HeaderListener as HpackHeaderListener};

pub use error::{WebError, WebResult};
