//! Standard Security Handler (§4.6).
//!
//! Scope is deliberately narrow: the Standard filter only, revisions 2-4
//! (RC4 or AES-128-CBC), and empty-password documents only. Anything else
//! — a non-Standard filter, AES-256/V5+, or a password that isn't the empty
//! string the caller supplied — surfaces as [`Error::Unsupported`] rather
//! than a parse failure, since the document itself is well-formed.

mod algorithms;
mod rc4;

use crate::error::{Error, Result};
use crate::object::{Dict, Object};
use crate::primitives::Primitives;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cipher {
    Rc4,
    Aes128Cbc,
}

/// Derived from a document's `/Encrypt` dictionary after successful
/// authentication. Holds the file key and enough of the dictionary to
/// derive per-object keys and know which streams to leave alone.
pub struct EncryptionContext {
    file_key: Vec<u8>,
    cipher: Cipher,
    encrypt_metadata: bool,
    primitives: Primitives,
}

impl EncryptionContext {
    /// Parse `/Encrypt`, derive the file key via Algorithm 2, and verify it
    /// against `/U` with the given password (empty, unless the caller
    /// supplied one). Anything outside Standard-filter R2-4 RC4/AES-128, or
    /// a password that fails verification, is `Unsupported` rather than a
    /// parse error — the document is well-formed, just out of scope.
    pub fn authenticate(encrypt_dict: &Dict, file_id: &[u8], password: &str, primitives: &Primitives) -> Result<Self> {
        let filter = encrypt_dict.get("Filter").and_then(Object::as_name).unwrap_or("Standard");
        if filter != "Standard" {
            return Err(Error::unsupported(format!("security handler '{}' is not supported", filter)));
        }

        let v = encrypt_dict.get("V").and_then(Object::as_int).unwrap_or(0);
        let r = encrypt_dict.get("R").and_then(Object::as_int).unwrap_or(0);
        if !(2..=4).contains(&r) {
            return Err(Error::unsupported(format!("encryption revision R={} is not supported", r)));
        }

        let key_length_bits = encrypt_dict.get("Length").and_then(Object::as_int).unwrap_or(40);
        let key_length = (key_length_bits as usize / 8).clamp(5, 16);

        let owner_key = encrypt_dict.get("O").and_then(Object::as_string_bytes).ok_or_else(|| Error::unsupported("/Encrypt missing /O"))?;
        let user_key = encrypt_dict.get("U").and_then(Object::as_string_bytes).ok_or_else(|| Error::unsupported("/Encrypt missing /U"))?;
        let permissions = encrypt_dict.get("P").and_then(Object::as_int).unwrap_or(-1) as i32;
        let encrypt_metadata = encrypt_dict.get("EncryptMetadata").and_then(Object::as_bool).unwrap_or(true);

        let file_key = algorithms::authenticate_user_password(
            primitives,
            password.as_bytes(),
            user_key,
            owner_key,
            permissions,
            file_id,
            r as u32,
            key_length,
            encrypt_metadata,
        )
        .ok_or_else(|| Error::unsupported("document requires a password this reader does not have"))?;

        let cipher = select_cipher(encrypt_dict, v)?;

        Ok(Self { file_key, cipher, encrypt_metadata, primitives: primitives.clone() })
    }

    /// Decrypt every string and stream payload found directly on `obj`
    /// (§4.6 Algorithm 1 applied per-object). `obj` has already been parsed
    /// from the raw buffer; compressed (ObjStm) objects never reach here,
    /// since they were never individually encrypted to begin with.
    pub fn decrypt_object(&self, obj: Object, num: u32, gen: u16) -> Result<Object> {
        if !self.encrypt_metadata && is_metadata_stream(&obj) {
            return Ok(obj);
        }
        let object_key = self.compute_object_key(num, gen);
        self.decrypt_value(obj, &object_key)
    }

    fn decrypt_value(&self, obj: Object, object_key: &[u8]) -> Result<Object> {
        match obj {
            Object::String(bytes) => Ok(Object::String(self.decrypt_bytes(&bytes, object_key)?)),
            Object::Array(items) => {
                let items = items.into_iter().map(|i| self.decrypt_value(i, object_key)).collect::<Result<Vec<_>>>()?;
                Ok(Object::Array(items))
            },
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.decrypt_dict(dict, object_key)?)),
            Object::Stream { dict, data } => {
                let dict = self.decrypt_dict(dict, object_key)?;
                let data = self.decrypt_bytes(&data, object_key)?;
                Ok(Object::Stream { dict, data })
            },
            other => Ok(other),
        }
    }

    fn decrypt_dict(&self, dict: Dict, object_key: &[u8]) -> Result<Dict> {
        dict.into_iter().map(|(k, v)| Ok((k, self.decrypt_value(v, object_key)?))).collect()
    }

    fn decrypt_bytes(&self, data: &[u8], object_key: &[u8]) -> Result<Vec<u8>> {
        match self.cipher {
            Cipher::Rc4 => Ok(rc4::rc4_crypt(object_key, data)),
            Cipher::Aes128Cbc => {
                if data.len() < 16 {
                    return Ok(Vec::new());
                }
                // The leading 16 bytes are the IV (part of the PDF wire
                // format, not the cipher); the rest is PKCS#7-padded
                // ciphertext the injected primitive unpads for us.
                let (iv, ciphertext) = data.split_at(16);
                self.primitives.aes_cbc_decrypt(object_key, iv, ciphertext).map_err(Error::Decode)
            },
        }
    }

    /// Algorithm 1: derive the per-object key from the file key and the
    /// object's number/generation, truncated to `min(len(file_key)+5, 16)`.
    fn compute_object_key(&self, num: u32, gen: u16) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.file_key.len() + 5 + 4);
        input.extend_from_slice(&self.file_key);
        input.extend_from_slice(&num.to_le_bytes()[..3]);
        input.extend_from_slice(&gen.to_le_bytes()[..2]);
        if self.cipher == Cipher::Aes128Cbc {
            input.extend_from_slice(b"sAlT");
        }
        let digest = self.primitives.md5(&input);
        let len = (self.file_key.len() + 5).min(16);
        digest[..len].to_vec()
    }
}

fn select_cipher(encrypt_dict: &Dict, v: i64) -> Result<Cipher> {
    if v < 4 {
        return Ok(Cipher::Rc4);
    }
    let cfm = encrypt_dict
        .get("CF")
        .and_then(Object::as_dict)
        .and_then(|cf| cf.get("StdCF"))
        .and_then(Object::as_dict)
        .and_then(|std_cf| std_cf.get("CFM"))
        .and_then(Object::as_name)
        .unwrap_or("V2");

    match cfm {
        "V2" => Ok(Cipher::Rc4),
        "AESV2" => Ok(Cipher::Aes128Cbc),
        other => Err(Error::unsupported(format!("crypt filter method '{}' is not supported", other))),
    }
}

fn is_metadata_stream(obj: &Object) -> bool {
    obj.as_dict().and_then(|d| d.get("Type")).and_then(Object::as_name) == Some("Metadata")
}
