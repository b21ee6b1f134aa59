//! PDF encryption support according to ISO 32000-1 Chapter 7.6
//!
//! This module implements the Standard Security Handler: RC4 40-bit and
//! 128-bit (revisions 2 and 3), AES-128 crypt filters (revision 4) and
//! AES-256 (revisions 5 and 6).

mod aes;
mod encryption_dict;
mod object_encryption;
mod permissions;
mod rc4;
mod standard_security;

pub use aes::{aes_cbc_decrypt, aes_cbc_encrypt};
pub use encryption_dict::{CryptMethod, EncryptionState};
pub use object_encryption::{decrypt_object, encrypt_object, ObjectEncryptor};
pub use permissions::Permissions;
pub use rc4::{rc4_transform, Rc4};
pub use standard_security::{
    object_key, EncryptionAlgorithm, EncryptionKey, SecurityHandlerRevision,
    StandardSecurityHandler, PADDING,
};

/// Security handler errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Wrong password")]
    WrongPassword,

    #[error("Corrupt ciphertext: {0}")]
    CorruptCiphertext(String),

    #[error("Invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("Encryption dictionary lacks key-check value {0}")]
    MissingKeyCheck(&'static str),
}

/// Authenticate `password` against an encryption dictionary and return the
/// file key
pub fn authenticate(state: &EncryptionState, password: &[u8]) -> Result<EncryptionKey, AuthError> {
    StandardSecurityHandler::for_state(state).authenticate(state, password)
}
