//! PDF encryption dictionary structures

use super::standard_security::SecurityHandlerRevision;
use super::Permissions;
use crate::objects::{Dictionary, Object};
use crate::parser::{ParseError, ParseResult};

/// Cipher applied by a crypt filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    /// No encryption
    Identity,
    /// RC4 (`/V2`)
    Rc4,
    /// AES-128 (`/AESV2`)
    AesV2,
    /// AES-256 (`/AESV3`)
    AesV3,
}

impl CryptMethod {
    /// Get PDF name
    pub fn pdf_name(&self) -> &'static str {
        match self {
            CryptMethod::Identity => "None",
            CryptMethod::Rc4 => "V2",
            CryptMethod::AesV2 => "AESV2",
            CryptMethod::AesV3 => "AESV3",
        }
    }

    fn from_cfm(name: &str) -> Option<Self> {
        match name {
            "None" => Some(CryptMethod::Identity),
            "V2" => Some(CryptMethod::Rc4),
            "AESV2" => Some(CryptMethod::AesV2),
            "AESV3" => Some(CryptMethod::AesV3),
            _ => None,
        }
    }
}

/// Decoded `/Encrypt` dictionary of the standard security handler plus the
/// first element of the trailer `/ID`
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionState {
    /// Algorithm version `/V`
    pub version: i64,
    pub revision: SecurityHandlerRevision,
    /// File key length in bytes
    pub key_length: usize,
    /// `/O`
    pub owner_hash: Vec<u8>,
    /// `/U`
    pub user_hash: Vec<u8>,
    /// `/OE` (revision 5 and 6)
    pub owner_encrypted_key: Option<Vec<u8>>,
    /// `/UE` (revision 5 and 6)
    pub user_encrypted_key: Option<Vec<u8>>,
    /// `/Perms` (revision 5 and 6)
    pub perms: Option<Vec<u8>>,
    /// Raw `/P`, as used by key derivation
    pub p_value: i32,
    pub encrypt_metadata: bool,
    pub string_method: CryptMethod,
    pub stream_method: CryptMethod,
    pub file_id: Vec<u8>,
}

impl EncryptionState {
    /// Read an `/Encrypt` dictionary. Only the `/Standard` filter is supported.
    pub fn from_dict(dict: &Dictionary, file_id: &[u8]) -> ParseResult<Self> {
        match dict.get_name("Filter") {
            Some("Standard") => {}
            Some(other) => return Err(ParseError::UnsupportedEncryption(other.to_string())),
            None => return Err(ParseError::MissingKey("Filter".to_string())),
        }

        let version = dict.get_integer("V").unwrap_or(0);
        let revision_number = dict
            .get_integer("R")
            .ok_or_else(|| ParseError::MissingKey("R".to_string()))?;
        let revision = SecurityHandlerRevision::from_number(revision_number).ok_or_else(|| {
            ParseError::UnsupportedEncryption(format!("security handler revision {revision_number}"))
        })?;

        let bytes = |key: &str| dict.get(key).and_then(Object::as_string).map(<[u8]>::to_vec);
        let owner_hash = bytes("O").ok_or_else(|| ParseError::MissingKey("O".to_string()))?;
        let user_hash = bytes("U").ok_or_else(|| ParseError::MissingKey("U".to_string()))?;
        let p_value = dict
            .get_integer("P")
            .ok_or_else(|| ParseError::MissingKey("P".to_string()))? as i32;
        let encrypt_metadata = dict
            .get("EncryptMetadata")
            .and_then(Object::as_bool)
            .unwrap_or(true);

        let (string_method, stream_method, key_length) = match version {
            0 | 1 => (CryptMethod::Rc4, CryptMethod::Rc4, 5),
            2 | 3 => {
                let bits = dict.get_integer("Length").unwrap_or(40);
                (CryptMethod::Rc4, CryptMethod::Rc4, key_bytes(bits)?)
            }
            4 | 5 => {
                let string_method = crypt_filter_method(dict, "StrF")?;
                let stream_method = crypt_filter_method(dict, "StmF")?;
                let key_length = if version == 5 {
                    32
                } else {
                    let bits = std_cf_length(dict)
                        .or_else(|| dict.get_integer("Length"))
                        .unwrap_or(128);
                    key_bytes(bits)?
                };
                (string_method, stream_method, key_length)
            }
            other => {
                return Err(ParseError::UnsupportedEncryption(format!(
                    "encryption algorithm version {other}"
                )))
            }
        };

        Ok(Self {
            version,
            revision,
            key_length,
            owner_hash,
            user_hash,
            owner_encrypted_key: bytes("OE"),
            user_encrypted_key: bytes("UE"),
            perms: bytes("Perms"),
            p_value,
            encrypt_metadata,
            string_method,
            stream_method,
            file_id: file_id.to_vec(),
        })
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::from_p_value(i64::from(self.p_value))
    }

    /// Build the `/Encrypt` dictionary for the writer
    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name("Standard".to_string()));
        dict.set("V", self.version);
        dict.set("R", self.revision.number());
        dict.set("O", self.owner_hash.clone());
        dict.set("U", self.user_hash.clone());
        dict.set("P", i64::from(self.p_value));

        if self.version >= 2 {
            dict.set("Length", (self.key_length * 8) as i64);
        }

        if self.version >= 4 {
            let mut std_cf = Dictionary::new();
            std_cf.set("Type", Object::Name("CryptFilter".to_string()));
            std_cf.set("CFM", Object::Name(self.stream_method.pdf_name().to_string()));
            std_cf.set("AuthEvent", Object::Name("DocOpen".to_string()));
            std_cf.set("Length", self.key_length as i64);

            let mut cf = Dictionary::new();
            cf.set("StdCF", std_cf);
            dict.set("CF", cf);
            dict.set("StmF", Object::Name("StdCF".to_string()));
            dict.set("StrF", Object::Name("StdCF".to_string()));
            if !self.encrypt_metadata {
                dict.set("EncryptMetadata", false);
            }
        }

        for (key, value) in [
            ("OE", &self.owner_encrypted_key),
            ("UE", &self.user_encrypted_key),
            ("Perms", &self.perms),
        ] {
            if let Some(value) = value {
                dict.set(key, value.clone());
            }
        }

        dict
    }
}

fn key_bytes(bits: i64) -> ParseResult<usize> {
    // Some writers store the length in bytes
    let bits = if bits <= 16 { bits * 8 } else { bits };
    if !(40..=128).contains(&bits) || bits % 8 != 0 {
        return Err(ParseError::UnsupportedEncryption(format!(
            "key length of {bits} bits"
        )));
    }
    Ok((bits / 8) as usize)
}

/// `/Length` of the standard crypt filter, in bits
fn std_cf_length(dict: &Dictionary) -> Option<i64> {
    let length = dict.get_dict("CF")?.get_dict("StdCF")?.get_integer("Length")?;
    Some(if length <= 32 { length * 8 } else { length })
}

/// Resolve `/StrF` or `/StmF` through `/CF`
fn crypt_filter_method(dict: &Dictionary, key: &str) -> ParseResult<CryptMethod> {
    let filter_name = dict.get_name(key).unwrap_or("Identity");
    if filter_name == "Identity" {
        return Ok(CryptMethod::Identity);
    }

    let filter = dict
        .get_dict("CF")
        .and_then(|cf| cf.get_dict(filter_name))
        .ok_or_else(|| ParseError::UnsupportedEncryption(format!("crypt filter {filter_name}")))?;

    let cfm = filter.get_name("CFM").unwrap_or("None");
    CryptMethod::from_cfm(cfm)
        .ok_or_else(|| ParseError::UnsupportedEncryption(format!("crypt filter method {cfm}")))
}
