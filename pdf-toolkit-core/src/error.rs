use crate::encryption::AuthError;
use crate::operations::OperationError;
use crate::parser::{CodecError, ParseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(ParseError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Operation failed: {0}")]
    Operation(OperationError),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),
}

impl PdfError {
    /// The document is encrypted and the supplied password opens neither the
    /// user nor the owner lock
    pub fn is_wrong_password(&self) -> bool {
        matches!(self, PdfError::Auth(AuthError::WrongPassword))
    }
}

// Wrapped errors are flattened so callers see one variant per failure class
impl From<ParseError> for PdfError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Auth(auth) => PdfError::Auth(auth),
            ParseError::StreamDecode(codec) => PdfError::Codec(codec),
            ParseError::Io(io) => PdfError::Io(io),
            other => PdfError::Parse(other),
        }
    }
}

impl From<OperationError> for PdfError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Parse(parse) => parse.into(),
            OperationError::Codec(codec) => PdfError::Codec(codec),
            OperationError::Auth(auth) => PdfError::Auth(auth),
            other => PdfError::Operation(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_pdf_error_display() {
        let error = PdfError::InvalidStructure("test message".to_string());
        assert_eq!(error.to_string(), "Invalid PDF structure: test message");
        assert_eq!(
            PdfError::from(AuthError::WrongPassword).to_string(),
            "Wrong password"
        );
    }

    #[test]
    fn test_wrong_password_through_parse_error() {
        let error: PdfError = ParseError::Auth(AuthError::WrongPassword).into();
        assert!(error.is_wrong_password());

        let error: PdfError = OperationError::Parse(ParseError::Auth(AuthError::WrongPassword)).into();
        assert!(error.is_wrong_password());
    }

    #[test]
    fn test_other_errors_are_not_wrong_password() {
        let error: PdfError = ParseError::MalformedHeader.into();
        assert!(!error.is_wrong_password());
        assert!(matches!(error, PdfError::Parse(ParseError::MalformedHeader)));

        let error = PdfError::from(AuthError::CorruptCiphertext("bad".to_string()));
        assert!(!error.is_wrong_password());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let pdf_error: PdfError = io_error.into();
        assert!(matches!(pdf_error, PdfError::Io(_)));

        let parse_error = ParseError::Io(IoError::new(ErrorKind::Other, "disk"));
        assert!(matches!(PdfError::from(parse_error), PdfError::Io(_)));
    }

    #[test]
    fn test_operation_error_conversion() {
        let error: PdfError = OperationError::NoPagesToProcess.into();
        assert!(matches!(
            error,
            PdfError::Operation(OperationError::NoPagesToProcess)
        ));
    }
}
