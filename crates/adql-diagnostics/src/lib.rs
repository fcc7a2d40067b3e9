//! ADQL diagnostics and error handling
//!
//! This crate provides the error infrastructure shared by the ADQL tokenizer,
//! parser, tree-mutation API and semantic checker: error codes, source
//! positions, the error families and diagnostic reporting.

mod error;
mod error_code;
mod position;

pub use error::*;
pub use error_code::*;
pub use position::*;

/// Result type for parse operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;
