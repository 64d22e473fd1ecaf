//! ASCII85Decode (Base85) implementation (§4.4).
//!
//! Represents 4 bytes as 5 ASCII characters in the range `!`..`u`. `z`
//! shorthand expands to four zero bytes; an optional `<~` prefix and a
//! `~>` terminator are both recognized and stripped.

use crate::error::{Error, Result};

/// Decode ASCII85-encoded data.
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut input = input;
    if let Some(rest) = input.strip_prefix(b"<~") {
        input = rest;
    }

    let mut output = Vec::new();
    let mut acc: u32 = 0;
    let mut count = 0;

    for &byte in input {
        match byte {
            b'~' => break,
            b'z' => {
                if count != 0 {
                    return Err(Error::Decode("ASCII85Decode: 'z' must not appear in the middle of a group".to_string()));
                }
                output.extend_from_slice(&[0, 0, 0, 0]);
            },
            b'!'..=b'u' => {
                acc = acc
                    .checked_mul(85)
                    .and_then(|v| v.checked_add((byte - b'!') as u32))
                    .ok_or_else(|| Error::Decode("ASCII85Decode: overflow in decoding".to_string()))?;
                count += 1;
                if count == 5 {
                    output.extend_from_slice(&acc.to_be_bytes());
                    acc = 0;
                    count = 0;
                }
            },
            _ if byte.is_ascii_whitespace() => {},
            _ => return Err(Error::Decode(format!("ASCII85Decode: invalid character '{}'", byte as char))),
        }
    }

    if count > 0 {
        if count == 1 {
            return Err(Error::Decode("ASCII85Decode: incomplete group (need at least 2 characters)".to_string()));
        }
        for _ in count..5 {
            acc = acc.checked_mul(85).and_then(|v| v.checked_add(84)).ok_or_else(|| Error::Decode("ASCII85Decode: overflow in padding".to_string()))?;
        }
        let bytes = acc.to_be_bytes();
        output.extend_from_slice(&bytes[..count - 1]);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_group() {
        assert_eq!(decode(b"<+U,m").unwrap(), b"Test");
    }

    #[test]
    fn strips_optional_prefix_and_terminator() {
        assert_eq!(decode(b"<~<+U,m~>").unwrap(), b"Test");
    }

    #[test]
    fn z_shorthand_expands_to_four_zero_bytes() {
        assert_eq!(decode(b"zz").unwrap(), b"\x00\x00\x00\x00\x00\x00\x00\x00");
    }

    #[test]
    fn whitespace_is_skipped() {
        assert_eq!(decode(b"<+U ,m").unwrap(), b"Test");
    }

    #[test]
    fn partial_final_group_is_padded_and_truncated() {
        let out = decode(b"!!").unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn z_in_middle_of_group_errors() {
        assert!(decode(b"!z").is_err());
    }

    #[test]
    fn single_char_final_group_errors() {
        assert!(decode(b"!").is_err());
    }
}
