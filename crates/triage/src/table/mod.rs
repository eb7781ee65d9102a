//! Table model and managed-column normalization.

mod normalize;
mod table;

pub use normalize::{is_missing_token, parse_skip_flag};
pub use table::{Row, Table};
