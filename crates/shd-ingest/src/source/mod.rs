//! Source file reading.

mod encoding;
mod reader;
mod table;

pub use encoding::SourceEncoding;
pub use reader::{DEFAULT_NA_TOKENS, ReadOptions, is_na_token, read_raw_table};
pub use table::RawTable;
