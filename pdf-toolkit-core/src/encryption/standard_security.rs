//! Standard Security Handler implementation according to ISO 32000-1
//! Section 7.6.3 and ISO 32000-2 Section 7.6.4 (revisions 5 and 6)

use super::aes::{aes_cbc_decrypt_no_padding, aes_cbc_encrypt_no_padding};
use super::encryption_dict::{CryptMethod, EncryptionState};
use super::rc4::{rc4_rounds, rc4_transform};
use super::{AuthError, Permissions};
use crate::objects::ObjectId;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Padding used in password processing
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Revision 5 and 6 passwords are truncated to this many UTF-8 bytes
const MAX_AES256_PASSWORD: usize = 127;

/// File encryption key
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey(Vec<u8>);

impl EncryptionKey {
    pub fn new(key: Vec<u8>) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Keys stay out of logs
impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionKey({} bytes)", self.0.len())
    }
}

/// Security handler revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityHandlerRevision {
    /// Revision 2 (RC4 40-bit)
    R2 = 2,
    /// Revision 3 (RC4 up to 128-bit)
    R3 = 3,
    /// Revision 4 (crypt filters: RC4 or AES-128)
    R4 = 4,
    /// Revision 5 (AES-256, deprecated SHA-256 key check)
    R5 = 5,
    /// Revision 6 (AES-256)
    R6 = 6,
}

impl SecurityHandlerRevision {
    pub fn from_number(revision: i64) -> Option<Self> {
        match revision {
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            _ => None,
        }
    }

    pub fn number(self) -> i64 {
        self as i64
    }

    fn is_aes256(self) -> bool {
        self >= Self::R5
    }
}

/// Standard Security Handler
#[derive(Debug, Clone, Copy)]
pub struct StandardSecurityHandler {
    revision: SecurityHandlerRevision,
    /// Key length in bytes
    key_length: usize,
}

impl StandardSecurityHandler {
    pub fn new(revision: SecurityHandlerRevision, key_length: usize) -> Self {
        let key_length = if revision.is_aes256() {
            32
        } else {
            key_length.clamp(5, 16)
        };
        Self {
            revision,
            key_length,
        }
    }

    /// RC4 40-bit, revision 2
    pub fn rc4_40bit() -> Self {
        Self::new(SecurityHandlerRevision::R2, 5)
    }

    /// RC4 128-bit, revision 3
    pub fn rc4_128bit() -> Self {
        Self::new(SecurityHandlerRevision::R3, 16)
    }

    /// AES-128 through crypt filters, revision 4
    pub fn aes_128() -> Self {
        Self::new(SecurityHandlerRevision::R4, 16)
    }

    /// AES-256, revision 6
    pub fn aes_256() -> Self {
        Self::new(SecurityHandlerRevision::R6, 32)
    }

    pub fn revision(&self) -> SecurityHandlerRevision {
        self.revision
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Pad or truncate password to 32 bytes
    pub fn pad_password(password: &[u8]) -> [u8; 32] {
        let mut padded = [0u8; 32];
        let len = password.len().min(32);
        padded[..len].copy_from_slice(&password[..len]);
        padded[len..].copy_from_slice(&PADDING[..32 - len]);
        padded
    }

    /// RC4 key derived from the owner password (Algorithm 3, steps a-d)
    fn owner_rc4_key(&self, owner_password: &[u8]) -> Vec<u8> {
        let mut hash = md5::compute(Self::pad_password(owner_password)).0.to_vec();
        if self.revision >= SecurityHandlerRevision::R3 {
            for _ in 0..50 {
                hash = md5::compute(&hash).0.to_vec();
            }
        }
        hash.truncate(self.key_length);
        hash
    }

    /// Owner password hash, the `/O` entry (Algorithm 3)
    pub fn compute_owner_hash(&self, owner_password: &[u8], user_password: &[u8]) -> Vec<u8> {
        let owner_password = if owner_password.is_empty() {
            user_password
        } else {
            owner_password
        };
        let key = self.owner_rc4_key(owner_password);
        let user_pad = Self::pad_password(user_password);

        if self.revision >= SecurityHandlerRevision::R3 {
            rc4_rounds(&key, &user_pad, false)
        } else {
            rc4_transform(&key, &user_pad)
        }
    }

    /// File encryption key from a user password (Algorithm 2)
    pub fn derive_key(
        &self,
        password: &[u8],
        owner_hash: &[u8],
        p_value: i32,
        file_id: &[u8],
        encrypt_metadata: bool,
    ) -> EncryptionKey {
        let mut data = Vec::with_capacity(32 + owner_hash.len() + 4 + file_id.len() + 4);
        data.extend_from_slice(&Self::pad_password(password));
        data.extend_from_slice(&owner_hash[..owner_hash.len().min(32)]);
        data.extend_from_slice(&p_value.to_le_bytes());
        data.extend_from_slice(file_id);
        if self.revision >= SecurityHandlerRevision::R4 && !encrypt_metadata {
            data.extend_from_slice(&[0xFF; 4]);
        }

        let mut hash = md5::compute(&data).0.to_vec();
        if self.revision >= SecurityHandlerRevision::R3 {
            for _ in 0..50 {
                hash = md5::compute(&hash[..self.key_length]).0.to_vec();
            }
        }
        hash.truncate(self.key_length);
        EncryptionKey::new(hash)
    }

    /// User password hash, the `/U` entry (Algorithms 4 and 5)
    pub fn compute_user_hash(&self, key: &EncryptionKey, file_id: &[u8]) -> Vec<u8> {
        if self.revision == SecurityHandlerRevision::R2 {
            return rc4_transform(key.as_bytes(), &PADDING);
        }

        let mut data = PADDING.to_vec();
        data.extend_from_slice(file_id);
        let hash = md5::compute(&data).0;

        let mut result = rc4_rounds(key.as_bytes(), &hash, false);
        // Arbitrary padding up to 32 bytes
        result.extend_from_slice(&PADDING[..16]);
        result
    }

    /// Compare a derived key against `/U` (Algorithms 6)
    pub fn check_user_password(&self, key: &EncryptionKey, user_hash: &[u8], file_id: &[u8]) -> bool {
        let computed = self.compute_user_hash(key, file_id);
        let significant = if self.revision == SecurityHandlerRevision::R2 {
            32
        } else {
            16
        };
        user_hash.len() >= significant && computed[..significant] == user_hash[..significant]
    }

    /// Recover the user password by decrypting `/O` with an owner password
    /// (Algorithm 7)
    fn recover_user_password(&self, owner_password: &[u8], owner_hash: &[u8]) -> Vec<u8> {
        let key = self.owner_rc4_key(owner_password);
        let owner_hash = &owner_hash[..owner_hash.len().min(32)];
        if self.revision >= SecurityHandlerRevision::R3 {
            rc4_rounds(&key, owner_hash, true)
        } else {
            rc4_transform(&key, owner_hash)
        }
    }

    /// Authenticate with `password` as user password, then as owner password.
    pub fn authenticate(
        &self,
        state: &EncryptionState,
        password: &[u8],
    ) -> Result<EncryptionKey, AuthError> {
        if self.revision.is_aes256() {
            return self.authenticate_aes256(state, password);
        }

        let try_user = |candidate: &[u8]| {
            let key = self.derive_key(
                candidate,
                &state.owner_hash,
                state.p_value,
                &state.file_id,
                state.encrypt_metadata,
            );
            self.check_user_password(&key, &state.user_hash, &state.file_id)
                .then_some(key)
        };

        if let Some(key) = try_user(password) {
            tracing::debug!("Authenticated with the user password");
            return Ok(key);
        }

        let recovered = self.recover_user_password(password, &state.owner_hash);
        if let Some(key) = try_user(&recovered) {
            tracing::debug!("Authenticated with the owner password");
            return Ok(key);
        }

        Err(AuthError::WrongPassword)
    }

    /// Revision 5/6 hash (Algorithm 2.A / 2.B)
    fn hash_aes256(
        &self,
        password: &[u8],
        salt: &[u8],
        user_data: &[u8],
    ) -> Result<[u8; 32], AuthError> {
        let password = &password[..password.len().min(MAX_AES256_PASSWORD)];

        let mut k: Vec<u8> = Sha256::new()
            .chain_update(password)
            .chain_update(salt)
            .chain_update(user_data)
            .finalize()
            .to_vec();

        if self.revision == SecurityHandlerRevision::R6 {
            let mut round = 0usize;
            loop {
                let mut block = Vec::with_capacity(password.len() + k.len() + user_data.len());
                block.extend_from_slice(password);
                block.extend_from_slice(&k);
                block.extend_from_slice(user_data);
                let k1 = block.repeat(64);

                let mut iv = [0u8; 16];
                iv.copy_from_slice(&k[16..32]);
                let e = aes_cbc_encrypt_no_padding(&k[..16], &iv, &k1)?;

                let remainder = e[..16].iter().map(|&b| u32::from(b)).sum::<u32>() % 3;
                k = match remainder {
                    0 => Sha256::digest(&e).to_vec(),
                    1 => Sha384::digest(&e).to_vec(),
                    _ => Sha512::digest(&e).to_vec(),
                };

                round += 1;
                let last = usize::from(e[e.len() - 1]);
                if round >= 64 && last + 32 <= round {
                    break;
                }
            }
        }

        let mut out = [0u8; 32];
        out.copy_from_slice(&k[..32]);
        Ok(out)
    }

    fn authenticate_aes256(
        &self,
        state: &EncryptionState,
        password: &[u8],
    ) -> Result<EncryptionKey, AuthError> {
        let u = &state.user_hash;
        let o = &state.owner_hash;
        if u.len() < 48 || o.len() < 48 {
            return Err(AuthError::MissingKeyCheck("U/O"));
        }

        let (hash_key_salt, user_data, wrapped) =
            if self.hash_aes256(password, &u[32..40], &[])?[..] == u[..32] {
                tracing::debug!("Authenticated with the user password");
                (&u[40..48], &[][..], state.user_encrypted_key.as_deref())
            } else if self.hash_aes256(password, &o[32..40], &u[..48])?[..] == o[..32] {
                tracing::debug!("Authenticated with the owner password");
                (&o[40..48], &u[..48], state.owner_encrypted_key.as_deref())
            } else {
                return Err(AuthError::WrongPassword);
            };

        let wrapped = wrapped
            .filter(|w| w.len() >= 32)
            .ok_or(AuthError::MissingKeyCheck("UE/OE"))?;
        let intermediate = self.hash_aes256(password, hash_key_salt, user_data)?;
        let file_key = aes_cbc_decrypt_no_padding(&intermediate, &[0u8; 16], &wrapped[..32])?;
        Ok(EncryptionKey::new(file_key))
    }

    /// Build `/U`, `/UE`, `/O`, `/OE` and `/Perms` for revision 6.
    ///
    /// Salts come from `random`, which must provide 32 bytes.
    pub(crate) fn create_aes256_entries(
        &self,
        file_key: &EncryptionKey,
        user_password: &[u8],
        owner_password: &[u8],
        permissions: Permissions,
        encrypt_metadata: bool,
        random: &[u8; 32],
    ) -> Result<Aes256Entries, AuthError> {
        let (user_validation, user_key_salt) = (&random[0..8], &random[8..16]);
        let (owner_validation, owner_key_salt) = (&random[16..24], &random[24..32]);

        let mut u = self.hash_aes256(user_password, user_validation, &[])?.to_vec();
        u.extend_from_slice(user_validation);
        u.extend_from_slice(user_key_salt);
        let ue_key = self.hash_aes256(user_password, user_key_salt, &[])?;
        let ue = aes_cbc_encrypt_no_padding(&ue_key, &[0u8; 16], file_key.as_bytes())?;

        let mut o = self
            .hash_aes256(owner_password, owner_validation, &u)?
            .to_vec();
        o.extend_from_slice(owner_validation);
        o.extend_from_slice(owner_key_salt);
        let oe_key = self.hash_aes256(owner_password, owner_key_salt, &u)?;
        let oe = aes_cbc_encrypt_no_padding(&oe_key, &[0u8; 16], file_key.as_bytes())?;

        let mut perms_block = [0u8; 16];
        perms_block[..4].copy_from_slice(&permissions.to_p_value().to_le_bytes());
        perms_block[4..8].copy_from_slice(&[0xFF; 4]);
        perms_block[8] = if encrypt_metadata { b'T' } else { b'F' };
        perms_block[9..12].copy_from_slice(b"adb");
        perms_block[12..16].copy_from_slice(&random[..4]);
        // A single block: CBC with a zero IV is ECB
        let perms = aes_cbc_encrypt_no_padding(file_key.as_bytes(), &[0u8; 16], &perms_block)?;

        Ok(Aes256Entries { u, ue, o, oe, perms })
    }
}

/// Algorithms offered when protecting a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionAlgorithm {
    /// RC4 40-bit, revision 2
    Rc4_40,
    /// RC4 128-bit, revision 3
    #[default]
    Rc4_128,
    /// AES-128 crypt filters, revision 4
    Aes128,
    /// AES-256, revision 6
    Aes256,
}

impl StandardSecurityHandler {
    pub fn for_algorithm(algorithm: EncryptionAlgorithm) -> Self {
        match algorithm {
            EncryptionAlgorithm::Rc4_40 => Self::rc4_40bit(),
            EncryptionAlgorithm::Rc4_128 => Self::rc4_128bit(),
            EncryptionAlgorithm::Aes128 => Self::aes_128(),
            EncryptionAlgorithm::Aes256 => Self::aes_256(),
        }
    }

    /// Handler matching a parsed encryption dictionary
    pub fn for_state(state: &EncryptionState) -> Self {
        Self::new(state.revision, state.key_length)
    }

    /// Compute the key-check entries and file key for a new encryption
    /// dictionary. An empty owner password falls back to the user password.
    pub fn create_state(
        &self,
        user_password: &[u8],
        owner_password: &[u8],
        permissions: Permissions,
        file_id: &[u8],
    ) -> Result<(EncryptionState, EncryptionKey), AuthError> {
        let owner_password = if owner_password.is_empty() {
            user_password
        } else {
            owner_password
        };
        let p_value = permissions.to_p_value();

        let (version, method) = match self.revision {
            SecurityHandlerRevision::R2 => (1, CryptMethod::Rc4),
            SecurityHandlerRevision::R3 => (2, CryptMethod::Rc4),
            SecurityHandlerRevision::R4 => (4, CryptMethod::AesV2),
            SecurityHandlerRevision::R5 | SecurityHandlerRevision::R6 => (5, CryptMethod::AesV3),
        };

        let mut state = EncryptionState {
            version,
            revision: self.revision,
            key_length: self.key_length,
            owner_hash: Vec::new(),
            user_hash: Vec::new(),
            owner_encrypted_key: None,
            user_encrypted_key: None,
            perms: None,
            p_value,
            encrypt_metadata: true,
            string_method: method,
            stream_method: method,
            file_id: file_id.to_vec(),
        };

        if self.revision.is_aes256() {
            let file_key = EncryptionKey::new(rand::random::<[u8; 32]>().to_vec());
            let entries = self.create_aes256_entries(
                &file_key,
                user_password,
                owner_password,
                permissions,
                true,
                &rand::random::<[u8; 32]>(),
            )?;
            state.user_hash = entries.u;
            state.owner_hash = entries.o;
            state.user_encrypted_key = Some(entries.ue);
            state.owner_encrypted_key = Some(entries.oe);
            state.perms = Some(entries.perms);
            return Ok((state, file_key));
        }

        state.owner_hash = self.compute_owner_hash(owner_password, user_password);
        let key = self.derive_key(user_password, &state.owner_hash, p_value, file_id, true);
        state.user_hash = self.compute_user_hash(&key, file_id);
        Ok((state, key))
    }
}

/// Key-check entries of a revision 6 encryption dictionary
#[derive(Debug, Clone)]
pub(crate) struct Aes256Entries {
    pub u: Vec<u8>,
    pub ue: Vec<u8>,
    pub o: Vec<u8>,
    pub oe: Vec<u8>,
    pub perms: Vec<u8>,
}

/// Per-object key (Algorithm 1). Revision 5/6 use the file key as is.
pub fn object_key(file_key: &EncryptionKey, id: ObjectId, method: CryptMethod) -> Vec<u8> {
    if method == CryptMethod::AesV3 {
        return file_key.as_bytes().to_vec();
    }

    let mut data = file_key.as_bytes().to_vec();
    data.extend_from_slice(&id.number().to_le_bytes()[..3]);
    data.extend_from_slice(&id.generation().to_le_bytes());
    if method == CryptMethod::AesV2 {
        data.extend_from_slice(b"sAlT");
    }

    let hash = md5::compute(&data).0;
    let len = (file_key.len() + 5).min(16);
    hash[..len].to_vec()
}

#[cfg(test)]
#[path = "standard_security_tests.rs"]
mod tests;
