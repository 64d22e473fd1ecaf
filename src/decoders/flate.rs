//! FlateDecode (§4.4): delegates to the injected inflate primitive. Relaxed
//! (non-strict-trailer) fallback lives inside the primitive itself
//! ([`crate::primitives::Primitives::default`]) so this module stays free
//! of any specific compression crate.

use crate::error::{Error, Result};
use crate::primitives::Primitives;

/// Decode FlateDecode-compressed data.
pub fn decode(input: &[u8], primitives: &Primitives) -> Result<Vec<u8>> {
    primitives.inflate(input).map_err(Error::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_via_injected_primitive() {
        let primitives = Primitives::new(|_data| Ok(b"decoded".to_vec()), |_d| [0u8; 16], |_k, _i, _d| Ok(Vec::new()));
        assert_eq!(decode(b"anything", &primitives).unwrap(), b"decoded");
    }

    #[test]
    fn propagates_inflate_failure_as_decode_error() {
        let primitives = Primitives::new(|_data| Err("bad zlib stream".to_string()), |_d| [0u8; 16], |_k, _i, _d| Ok(Vec::new()));
        let err = decode(b"garbage", &primitives).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
