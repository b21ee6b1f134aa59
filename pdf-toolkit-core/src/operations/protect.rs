//! Applying and removing password protection
//!
//! Documents are held decrypted in memory; protection attaches a security
//! handler state that the writer applies when serializing.

use super::{OperationError, OperationResult};
use crate::document::Encryption;
use crate::encryption::{authenticate, EncryptionAlgorithm, Permissions, StandardSecurityHandler};
use crate::objects::Object;
use crate::Document;

/// Options for protecting a document
#[derive(Debug, Clone, Default)]
pub struct ProtectOptions {
    /// Owner password; the user password is used when unset
    pub owner_password: Option<String>,
    /// Permissions granted to a user-password holder
    pub permissions: Permissions,
    /// Cipher and security handler revision
    pub algorithm: EncryptionAlgorithm,
}

impl ProtectOptions {
    pub fn with_owner_password(mut self, password: impl Into<String>) -> Self {
        self.owner_password = Some(password.into());
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_algorithm(mut self, algorithm: EncryptionAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Copy of `doc` that is written encrypted with `user_password`
pub fn add_encryption(
    doc: &Document,
    user_password: &str,
    options: &ProtectOptions,
) -> OperationResult<Document> {
    if doc.is_encrypted() {
        return Err(OperationError::AlreadyEncrypted);
    }

    let file_id = generate_file_id(doc);
    let handler = StandardSecurityHandler::for_algorithm(options.algorithm);
    let owner_password = options.owner_password.as_deref().unwrap_or_default();
    let (state, key) = handler.create_state(
        user_password.as_bytes(),
        owner_password.as_bytes(),
        options.permissions,
        &file_id,
    )?;

    tracing::debug!(
        "Protecting document with revision {} ({} byte key)",
        state.revision.number(),
        state.key_length
    );

    let mut protected = doc.clone();
    let id = Object::String(file_id);
    protected
        .trailer_mut()
        .set("ID", Object::Array(vec![id.clone(), id]));
    protected.set_encryption(Some(Encryption { state, key }));
    Ok(protected)
}

/// Copy of `doc` without encryption. `password` must open the document,
/// as either its user or owner password. Unencrypted documents are
/// returned unchanged.
pub fn remove_encryption(doc: &Document, password: &str) -> OperationResult<Document> {
    let Some(encryption) = doc.encryption() else {
        return Ok(doc.clone());
    };

    authenticate(&encryption.state, password.as_bytes())?;

    let mut plain = doc.clone();
    plain.set_encryption(None);
    Ok(plain)
}

/// 16-byte identifier from MD5 over the document's stream data, its object
/// count and random bytes
fn generate_file_id(doc: &Document) -> Vec<u8> {
    let mut context = md5::Context::new();
    for object in doc.objects().values() {
        if let Object::Stream(stream) = object {
            context.consume(&stream.data);
        }
    }
    context.consume(doc.objects().len().to_le_bytes());
    context.consume(rand::random::<[u8; 16]>());
    context.compute().0.to_vec()
}
