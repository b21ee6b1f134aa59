//! AES-CBC helpers for the AESV2 (128-bit) and AESV3 (256-bit) crypt filters
//!
//! Encrypted strings and streams carry a 16-byte IV in front of the
//! ciphertext and use PKCS#7 padding.

use super::AuthError;
use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const BLOCK: usize = 16;

/// Encrypt with PKCS#7 padding and return `iv || ciphertext`
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8; BLOCK], data: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut buffer = vec![0u8; data.len() + BLOCK];
    buffer[..data.len()].copy_from_slice(data);

    let ciphertext_len = match key.len() {
        16 => Aes128CbcEnc::new(key.into(), iv.as_slice().into())
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, data.len())
            .map(|c| c.len()),
        32 => Aes256CbcEnc::new(key.into(), iv.as_slice().into())
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, data.len())
            .map(|c| c.len()),
        other => return Err(AuthError::InvalidKeyLength(other)),
    }
    .map_err(|_| AuthError::CorruptCiphertext("padding buffer too small".to_string()))?;

    let mut output = Vec::with_capacity(BLOCK + ciphertext_len);
    output.extend_from_slice(iv);
    output.extend_from_slice(&buffer[..ciphertext_len]);
    Ok(output)
}

/// Decrypt `iv || ciphertext` and strip PKCS#7 padding
pub fn aes_cbc_decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AuthError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() < BLOCK || data.len() % BLOCK != 0 {
        return Err(AuthError::CorruptCiphertext(format!(
            "AES payload of {} bytes is not whole blocks",
            data.len()
        )));
    }

    let (iv, ciphertext) = data.split_at(BLOCK);
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    let mut buffer = ciphertext.to_vec();

    let plaintext_len = match key.len() {
        16 => Aes128CbcDec::new(key.into(), iv.into())
            .decrypt_padded_mut::<Pkcs7>(&mut buffer)
            .map(|p| p.len()),
        32 => Aes256CbcDec::new(key.into(), iv.into())
            .decrypt_padded_mut::<Pkcs7>(&mut buffer)
            .map(|p| p.len()),
        other => return Err(AuthError::InvalidKeyLength(other)),
    }
    .map_err(|_| AuthError::CorruptCiphertext("invalid PKCS#7 padding".to_string()))?;

    buffer.truncate(plaintext_len);
    Ok(buffer)
}

/// Raw AES-CBC over whole blocks without padding (key derivation helpers)
pub(crate) fn aes_cbc_encrypt_no_padding(
    key: &[u8],
    iv: &[u8; BLOCK],
    data: &[u8],
) -> Result<Vec<u8>, AuthError> {
    let mut buffer = data.to_vec();
    let len = buffer.len();
    match key.len() {
        16 => Aes128CbcEnc::new(key.into(), iv.as_slice().into())
            .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
            .map(|_| ()),
        32 => Aes256CbcEnc::new(key.into(), iv.as_slice().into())
            .encrypt_padded_mut::<NoPadding>(&mut buffer, len)
            .map(|_| ()),
        other => return Err(AuthError::InvalidKeyLength(other)),
    }
    .map_err(|_| AuthError::CorruptCiphertext("data is not whole blocks".to_string()))?;
    Ok(buffer)
}

/// Inverse of [`aes_cbc_encrypt_no_padding`]
pub(crate) fn aes_cbc_decrypt_no_padding(
    key: &[u8],
    iv: &[u8; BLOCK],
    data: &[u8],
) -> Result<Vec<u8>, AuthError> {
    let mut buffer = data.to_vec();
    match key.len() {
        16 => Aes128CbcDec::new(key.into(), iv.as_slice().into())
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map(|_| ()),
        32 => Aes256CbcDec::new(key.into(), iv.as_slice().into())
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map(|_| ()),
        other => return Err(AuthError::InvalidKeyLength(other)),
    }
    .map_err(|_| AuthError::CorruptCiphertext("data is not whole blocks".to_string()))?;
    Ok(buffer)
}
