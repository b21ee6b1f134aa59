//! PDF Parser Module
//!
//! Turns raw bytes into a [`Document`](crate::Document): header, cross-reference
//! chain (tables and streams), trailer, indirect objects, object streams and the
//! page tree. A damaged cross-reference chain falls back to a linear scan of the
//! file (see [`crate::recovery`]).

pub mod content;
pub mod filters;
pub mod header;
pub mod lexer;
pub mod object_stream;
pub mod objects;
pub mod page_tree;
pub mod reader;
pub mod xref;

#[cfg(test)]
pub(crate) mod test_helpers;

use crate::encryption::AuthError;
use crate::objects::ObjectId;

pub use self::content::{ContentOperation, ContentParser, TextElement};
pub use self::filters::{decode_stream, CodecError, Decoded, NativeCodec};
pub use self::reader::{ParseOptions, PdfReader};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed PDF header")]
    MalformedHeader,

    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Broken cross-reference data: {0}")]
    BrokenXref(String),

    #[error("Dangling object reference: {number} {generation} R")]
    DanglingReference { number: u32, generation: u16 },

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid trailer")]
    InvalidTrailer,

    #[error("Circular reference detected at {0}")]
    CircularReference(ObjectId),

    #[error("Stream decode error: {0}")]
    StreamDecode(#[from] CodecError),

    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ParseError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        ParseError::SyntaxError {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn dangling(id: ObjectId) -> Self {
        ParseError::DanglingReference {
            number: id.number(),
            generation: id.generation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        assert_eq!(ParseError::MalformedHeader.to_string(), "Malformed PDF header");
        assert_eq!(
            ParseError::dangling(ObjectId::new(9, 0)).to_string(),
            "Dangling object reference: 9 0 R"
        );
        assert_eq!(
            ParseError::syntax(42, "Unterminated string").to_string(),
            "Syntax error at position 42: Unterminated string"
        );
    }

    #[test]
    fn test_auth_error_is_transparent() {
        let err: ParseError = AuthError::WrongPassword.into();
        assert_eq!(err.to_string(), AuthError::WrongPassword.to_string());
    }
}
