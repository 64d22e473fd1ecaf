//! Standard Security Handler key-derivation algorithms (§4.6), routed
//! through the injected MD5 primitive rather than naming a crate directly.

use crate::primitives::Primitives;

/// Algorithm 2, step 1's fixed 32-byte padding string.
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68,
    0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Right-pad (or truncate) a password to 32 bytes with [`PADDING`].
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    if len < 32 {
        padded[len..].copy_from_slice(&PADDING[..32 - len]);
    }
    padded
}

/// Algorithm 2: derive the file encryption key from a password.
#[allow(clippy::too_many_arguments)]
pub fn compute_encryption_key(
    primitives: &Primitives,
    password: &[u8],
    owner_key: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: u32,
    key_length: usize,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let padded = pad_password(password);
    let mut input = Vec::with_capacity(32 + owner_key.len() + 4 + file_id.len() + 4);
    input.extend_from_slice(&padded);
    input.extend_from_slice(owner_key);
    input.extend_from_slice(&permissions.to_le_bytes());
    input.extend_from_slice(file_id);
    if revision >= 4 && !encrypt_metadata {
        input.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    let mut hash = primitives.md5(&input).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            hash = primitives.md5(&hash[..key_length]).to_vec();
        }
    }
    hash[..key_length].to_vec()
}

/// Algorithm 4 (R==2): RC4-encrypt the padding string with the file key.
pub fn compute_user_key_r2(key: &[u8]) -> Vec<u8> {
    super::rc4::rc4_crypt(key, &PADDING)
}

/// Algorithm 5 (R>=3): MD5(padding || file_id), then 20 rounds of RC4 with
/// the key XORed by the round index.
pub fn compute_user_key_r3(primitives: &Primitives, key: &[u8], file_id: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(32 + file_id.len());
    input.extend_from_slice(&PADDING);
    input.extend_from_slice(file_id);
    let mut hash = primitives.md5(&input).to_vec();

    for round in 0..20u8 {
        let modified_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
        hash = super::rc4::rc4_crypt(&modified_key, &hash);
    }
    hash
}

/// Algorithm 4/5: verify an (often empty) password against `/U`, returning
/// the file encryption key on success.
pub fn authenticate_user_password(
    primitives: &Primitives,
    password: &[u8],
    user_key: &[u8],
    owner_key: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: u32,
    key_length: usize,
    encrypt_metadata: bool,
) -> Option<Vec<u8>> {
    let key = compute_encryption_key(primitives, password, owner_key, permissions, file_id, revision, key_length, encrypt_metadata);
    let expected = if revision >= 3 { compute_user_key_r3(primitives, &key, file_id) } else { compute_user_key_r2(&key) };
    if user_key.len() < 16 || expected.len() < 16 {
        return None;
    }
    if constant_time_compare(&user_key[..16], &expected[..16]) { Some(key) } else { None }
}

/// Constant-time byte comparison, to avoid leaking a timing side channel
/// during password verification.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_password_pads_short_input() {
        let padded = pad_password(b"test");
        assert_eq!(&padded[..4], b"test");
        assert_eq!(&padded[4..], &PADDING[..28]);
    }

    #[test]
    fn pad_password_truncates_long_input() {
        let long = [b'x'; 50];
        let padded = pad_password(&long);
        assert_eq!(padded, [b'x'; 32]);
    }

    #[test]
    fn constant_time_compare_detects_mismatch() {
        assert!(constant_time_compare(b"abcd", b"abcd"));
        assert!(!constant_time_compare(b"abcd", b"abce"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }

    #[test]
    fn compute_encryption_key_has_requested_length() {
        let primitives = Primitives::default();
        let key = compute_encryption_key(&primitives, b"", &[0u8; 32], -1, b"fileid12345678", 3, 16, true);
        assert_eq!(key.len(), 16);
    }
}
