use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Text encoding of corpus and output files
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO 8859-1, every byte is the code point of the same value
    Latin1,
}

impl Encoding {
    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes)
                .map_err(|e| Error::Encoding(format!("decode input as UTF-8: {}", e))),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Latin1 => text
                .chars()
                .map(|c| match u8::try_from(u32::from(c)) {
                    Ok(b) => Ok(b),
                    Err(_) => Err(Error::Encoding(format!("encode {:?} as Latin-1", c))),
                })
                .collect(),
        }
    }

    /// Read and decode the whole file at `path`
    pub fn read(self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        self.decode(bytes)
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            _ => Err(Error::Encoding(format!("handle unknown encoding {:?}", s))),
        }
    }
}
