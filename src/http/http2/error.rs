use std::fmt;

use super::hpack::HpackError;

#[derive(Debug)]
pub enum Http2Error {
    Hpack(HpackError),
}

impl Http2Error {
    #[inline]
    pub fn description_str(&self) -> &'static str {
        match self {
            Http2Error::Hpack(e) => e.description_str(),
        }
    }
}

impl From<HpackError> for Http2Error {
    fn from(e: HpackError) -> Self {
        Http2Error::Hpack(e)
    }
}

impl fmt::Display for Http2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description_str())
    }
}
