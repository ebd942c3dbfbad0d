//! scrooge-ingest: statement file readers (CSV / workbook) and bank-specific
//! layouts producing serialized canonical rows.

pub mod error;
pub mod parser;
pub mod parsers;
pub mod sources;

pub use error::ParseError;
pub use parser::StatementParser;
pub use sources::FileFormat;
