//! Injected cryptographic and compression primitives.
//!
//! The core pipeline never names a specific compression or crypto crate
//! (§1 Non-goals, §9 Design Notes: "Injectable primitives"). Instead a
//! [`Primitives`] bundle of three pure callables is supplied once, at
//! construction time, and threaded through the stream decoder and security
//! handler. [`Primitives::default()`] is a thin convenience wrapper around
//! `flate2`/`md-5`/`aes`+`cbc` — the same crates the teacher repo already
//! depends on for these concerns — so callers who don't care can just use
//! `Primitives::default()`.

use std::sync::Arc;

/// Three host-provided, side-effect-free callables the core depends on.
/// They are assumed thread-safe because the core never invokes them
/// concurrently (§5).
#[derive(Clone)]
pub struct Primitives {
    inflate: Arc<dyn Fn(&[u8]) -> Result<Vec<u8>, String> + Send + Sync>,
    md5: Arc<dyn Fn(&[u8]) -> [u8; 16] + Send + Sync>,
    aes_cbc_decrypt: Arc<dyn Fn(&[u8], &[u8], &[u8]) -> Result<Vec<u8>, String> + Send + Sync>,
}

impl std::fmt::Debug for Primitives {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Primitives").finish_non_exhaustive()
    }
}

impl Primitives {
    /// Build a bundle from three explicit callables. Use this to inject a
    /// WASM-hosted zlib, a hardware MD5, or anything else; the core never
    /// cares which library backs them.
    pub fn new(
        inflate: impl Fn(&[u8]) -> Result<Vec<u8>, String> + Send + Sync + 'static,
        md5: impl Fn(&[u8]) -> [u8; 16] + Send + Sync + 'static,
        aes_cbc_decrypt: impl Fn(&[u8], &[u8], &[u8]) -> Result<Vec<u8>, String> + Send + Sync + 'static,
    ) -> Self {
        Self { inflate: Arc::new(inflate), md5: Arc::new(md5), aes_cbc_decrypt: Arc::new(aes_cbc_decrypt) }
    }

    pub(crate) fn inflate(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        (self.inflate)(data)
    }

    pub(crate) fn md5(&self, data: &[u8]) -> [u8; 16] {
        (self.md5)(data)
    }

    pub(crate) fn aes_cbc_decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, String> {
        (self.aes_cbc_decrypt)(key, iv, data)
    }
}

impl Default for Primitives {
    /// The convenience wrapper: zlib inflate via `flate2` with a raw-deflate
    /// fallback (the "relaxed mode" §4.4 asks for when the strict ZLIB
    /// trailer doesn't check out), MD5 via `md-5`, and AES-128-CBC with
    /// PKCS#7 unpadding via `aes`+`cbc`.
    fn default() -> Self {
        Self::new(default_inflate, default_md5, default_aes_cbc_decrypt)
    }
}

fn default_inflate(data: &[u8]) -> Result<Vec<u8>, String> {
    use std::io::Read;

    let mut out = Vec::new();
    let mut zlib = flate2::read::ZlibDecoder::new(data);
    match zlib.read_to_end(&mut out) {
        Ok(_) if !out.is_empty() => Ok(out),
        _ => {
            // Relaxed mode: some producers emit corrupt zlib trailers (or
            // none at all) over otherwise-valid deflate data.
            out.clear();
            let mut raw = flate2::read::DeflateDecoder::new(data);
            raw.read_to_end(&mut out).map_err(|e| e.to_string())?;
            Ok(out)
        },
    }
}

fn default_md5(data: &[u8]) -> [u8; 16] {
    use md5::{Digest, Md5};
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn default_aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, String> {
    use aes::Aes128;
    use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};

    type Aes128CbcDec = cbc::Decryptor<Aes128>;

    if key.len() != 16 || iv.len() != 16 {
        return Err("AES-128-CBC requires a 16-byte key and IV".to_string());
    }
    let decryptor = Aes128CbcDec::new(key.into(), iv.into());
    decryptor.decrypt_padded_vec_mut::<Pkcs7>(data).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_inflate_round_trips_zlib() {
        use std::io::Write;
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"hello world").unwrap();
        let compressed = enc.finish().unwrap();
        let primitives = Primitives::default();
        assert_eq!(primitives.inflate(&compressed).unwrap(), b"hello world");
    }

    #[test]
    fn default_md5_matches_known_vector() {
        let primitives = Primitives::default();
        let digest = primitives.md5(b"");
        assert_eq!(digest, [0xd4, 0x1d, 0x8c, 0xd9, 0x8f, 0x00, 0xb2, 0x04, 0xe9, 0x80, 0x09, 0x98, 0xec, 0xf8, 0x42, 0x7e]);
    }

    #[test]
    fn custom_primitives_are_used() {
        let primitives = Primitives::new(
            |_data| Ok(b"custom".to_vec()),
            |_data| [7u8; 16],
            |_key, _iv, _data| Ok(b"aes".to_vec()),
        );
        assert_eq!(primitives.inflate(b"anything").unwrap(), b"custom");
        assert_eq!(primitives.md5(b"x"), [7u8; 16]);
        assert_eq!(primitives.aes_cbc_decrypt(&[0; 16], &[0; 16], b"y").unwrap(), b"aes");
    }
}
