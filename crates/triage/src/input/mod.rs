//! Input parsing and data source handling.

mod encoding;
mod parser;
mod source;

pub use encoding::{TextEncoding, decode_with_fallback};
pub use parser::{Parser, ParserConfig, format_name, hash_bytes};
pub use source::{RawTable, SourceMetadata};
