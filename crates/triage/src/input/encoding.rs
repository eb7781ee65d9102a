//! Text decoding with a single legacy fallback.

use std::borrow::Cow;

use encoding_rs::{UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};

/// Bytes with no assigned character in the Windows-1252 codepage.
const WINDOWS_1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// A text encoding the loader can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
    Windows1252,
}

impl TextEncoding {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Decode `bytes`, returning `None` if they are not valid in this encoding.
    ///
    /// A leading UTF-8 byte order mark is dropped. Windows-1252 rejects its
    /// undefined bytes instead of mapping them to control characters.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = match encoding_rs::Encoding::for_bom(bytes) {
                    Some((encoding, len)) if encoding == UTF_8 => &bytes[len..],
                    _ => bytes,
                };
                UTF_8
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(Cow::into_owned)
            }
            TextEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes).into_owned()),
            TextEncoding::Windows1252 => {
                if bytes.iter().any(|b| WINDOWS_1252_UNDEFINED.contains(b)) {
                    return None;
                }
                WINDOWS_1252
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(Cow::into_owned)
            }
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "windows-1252" | "cp1252" => Ok(TextEncoding::Windows1252),
            _ => Err(format!(
                "Unknown encoding: {}. Use utf-8, latin-1, or windows-1252.",
                s
            )),
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode with `primary`, then `fallback`. Returns the text and the encoding that worked.
pub fn decode_with_fallback(
    bytes: &[u8],
    primary: TextEncoding,
    fallback: TextEncoding,
) -> Option<(String, TextEncoding)> {
    if let Some(text) = primary.decode(bytes) {
        return Some((text, primary));
    }
    tracing::debug!(%primary, %fallback, "primary decoding failed, retrying");
    fallback.decode(bytes).map(|text| (text, fallback))
}
