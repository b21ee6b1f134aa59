//! Object encryption/decryption for PDF documents
//!
//! Strings and stream payloads are encrypted with a key derived from the file
//! key and the id of the indirect object that contains them, so the same
//! plaintext in two objects produces different ciphertext.

use super::aes::{aes_cbc_decrypt, aes_cbc_encrypt};
use super::encryption_dict::{CryptMethod, EncryptionState};
use super::rc4::rc4_transform;
use super::standard_security::{object_key, EncryptionKey};
use super::AuthError;
use crate::objects::{Dictionary, Object, ObjectId, Stream};

/// Encrypt `plaintext` belonging to object `id`.
///
/// AES output carries a fresh random IV in front of the ciphertext.
pub fn encrypt_object(
    key: &EncryptionKey,
    id: ObjectId,
    method: CryptMethod,
    plaintext: &[u8],
) -> Result<Vec<u8>, AuthError> {
    let object_key = object_key(key, id, method);
    match method {
        CryptMethod::Identity => Ok(plaintext.to_vec()),
        CryptMethod::Rc4 => Ok(rc4_transform(&object_key, plaintext)),
        CryptMethod::AesV2 | CryptMethod::AesV3 => {
            let iv: [u8; 16] = rand::random();
            aes_cbc_encrypt(&object_key, &iv, plaintext)
        }
    }
}

/// Inverse of [`encrypt_object`]
pub fn decrypt_object(
    key: &EncryptionKey,
    id: ObjectId,
    method: CryptMethod,
    ciphertext: &[u8],
) -> Result<Vec<u8>, AuthError> {
    let object_key = object_key(key, id, method);
    match method {
        CryptMethod::Identity => Ok(ciphertext.to_vec()),
        CryptMethod::Rc4 => Ok(rc4_transform(&object_key, ciphertext)),
        CryptMethod::AesV2 | CryptMethod::AesV3 => aes_cbc_decrypt(&object_key, ciphertext),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Applies the security handler to every string and stream of an indirect
/// object
pub struct ObjectEncryptor<'a> {
    key: &'a EncryptionKey,
    string_method: CryptMethod,
    stream_method: CryptMethod,
    encrypt_metadata: bool,
}

impl<'a> ObjectEncryptor<'a> {
    pub fn new(key: &'a EncryptionKey, state: &EncryptionState) -> Self {
        Self {
            key,
            string_method: state.string_method,
            stream_method: state.stream_method,
            encrypt_metadata: state.encrypt_metadata,
        }
    }

    /// Encrypt an object in place
    pub fn encrypt(&self, id: ObjectId, object: &mut Object) -> Result<(), AuthError> {
        self.apply(id, object, Direction::Encrypt)
    }

    /// Decrypt an object in place
    pub fn decrypt(&self, id: ObjectId, object: &mut Object) -> Result<(), AuthError> {
        self.apply(id, object, Direction::Decrypt)
    }

    fn transform(
        &self,
        id: ObjectId,
        method: CryptMethod,
        data: &[u8],
        direction: Direction,
    ) -> Result<Vec<u8>, AuthError> {
        match direction {
            Direction::Encrypt => encrypt_object(self.key, id, method, data),
            Direction::Decrypt => decrypt_object(self.key, id, method, data),
        }
    }

    fn apply(&self, id: ObjectId, object: &mut Object, direction: Direction) -> Result<(), AuthError> {
        match object {
            Object::String(bytes) => {
                *bytes = self.transform(id, self.string_method, bytes, direction)?;
            }
            Object::Array(items) => {
                for item in items.iter_mut() {
                    self.apply(id, item, direction)?;
                }
            }
            Object::Dictionary(dict) => self.apply_dict(id, dict, direction)?,
            Object::Stream(stream) => self.apply_stream(id, stream, direction)?,
            _ => {}
        }
        Ok(())
    }

    fn apply_dict(
        &self,
        id: ObjectId,
        dict: &mut Dictionary,
        direction: Direction,
    ) -> Result<(), AuthError> {
        // Signature /Contents hold the raw PKCS#7 blob
        let is_signature = dict.has_type("Sig") || dict.has_type("DocTimeStamp");

        for (key, value) in dict.iter_mut() {
            if is_signature && key == "Contents" {
                continue;
            }
            self.apply(id, value, direction)?;
        }
        Ok(())
    }

    fn apply_stream(
        &self,
        id: ObjectId,
        stream: &mut Stream,
        direction: Direction,
    ) -> Result<(), AuthError> {
        if stream.dict.has_type("XRef") {
            return Ok(());
        }

        self.apply_dict(id, &mut stream.dict, direction)?;

        let skip_payload = (stream.dict.has_type("Metadata") && !self.encrypt_metadata)
            || stream.filters().first().map(String::as_str) == Some("Crypt");
        if !skip_payload {
            let data = self.transform(id, self.stream_method, &stream.data, direction)?;
            stream.set_data(data);
        }
        Ok(())
    }
}
