//! LZWDecode implementation for PDF (§4.4).
//!
//! PDF's LZW implementation:
//! - Uses MSB-first bit ordering
//! - Starts with 9-bit codes, widens up to 12 bits as the table fills
//! - `EarlyChange` (default 1) widens the code one code earlier than GIF/TIFF
//! - Clear code is 256, EOD code is 257, first available code is 258

use crate::error::{Error, Result};
use std::collections::HashMap;

const CLEAR_CODE: u16 = 256;
const EOD_CODE: u16 = 257;
const FIRST_CODE: u16 = 258;
const MAX_CODE_BITS: u8 = 12;

/// Decode LZW-compressed data. `early_change` mirrors `/DecodeParms
/// /EarlyChange`; PDF defaults it to `true` (1).
pub fn decode(input: &[u8], early_change: bool) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut table = init_table();
    let mut code_bits = 9;
    let mut next_code = FIRST_CODE;
    let mut bits = BitReader::new(input);
    let mut prev_code: Option<u16> = None;
    let early_bump = if early_change { 1 } else { 0 };

    loop {
        if code_bits < MAX_CODE_BITS {
            let threshold = (1u16 << code_bits) - early_bump;
            if next_code >= threshold {
                code_bits += 1;
            }
        }

        let code = match bits.read_bits(code_bits) {
            Some(c) => c as u16,
            None => break,
        };

        if code == EOD_CODE {
            break;
        }
        if code == CLEAR_CODE {
            table = init_table();
            code_bits = 9;
            next_code = FIRST_CODE;
            prev_code = None;
            continue;
        }

        let string = if code < next_code {
            table.get(&code).ok_or_else(|| Error::Decode(format!("invalid LZW code {}", code)))?.clone()
        } else if code == next_code && prev_code.is_some() {
            let prev_string = &table[&prev_code.unwrap()];
            let mut s = prev_string.clone();
            s.push(prev_string[0]);
            s
        } else {
            return Err(Error::Decode(format!("invalid LZW code {} (next_code={})", code, next_code)));
        };

        output.extend_from_slice(&string);

        if let Some(prev) = prev_code {
            if next_code < 4096 {
                let mut new_string = table[&prev].clone();
                new_string.push(string[0]);
                table.insert(next_code, new_string);
                next_code += 1;
            }
        }

        prev_code = Some(code);
    }

    Ok(output)
}

fn init_table() -> HashMap<u16, Vec<u8>> {
    (0..=255u16).map(|i| (i, vec![i as u8])).collect()
}

struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, byte_pos: 0, bit_pos: 0 }
    }

    fn read_bits(&mut self, n: u8) -> Option<u32> {
        if n == 0 || n > 16 {
            return None;
        }
        let mut result = 0u32;
        let mut remaining = n;
        while remaining > 0 {
            if self.byte_pos >= self.data.len() {
                return None;
            }
            let bits_in_current_byte = 8 - self.bit_pos;
            let bits_to_read = remaining.min(bits_in_current_byte);
            let byte = self.data[self.byte_pos];
            let shift = bits_in_current_byte - bits_to_read;
            let mask = if bits_to_read == 8 { 0xFF } else { ((1u8 << bits_to_read) - 1) << shift };
            let bits = (byte & mask) >> shift;
            result = (result << bits_to_read) | (bits as u32);
            self.bit_pos += bits_to_read;
            if self.bit_pos >= 8 {
                self.byte_pos += 1;
                self.bit_pos = 0;
            }
            remaining -= bits_to_read;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_reference(codes: &[u16], widths: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut acc: u64 = 0;
        let mut acc_bits = 0u8;
        for (&code, &width) in codes.iter().zip(widths) {
            acc = (acc << width) | code as u64;
            acc_bits += width;
            while acc_bits >= 8 {
                let shift = acc_bits - 8;
                out.push(((acc >> shift) & 0xFF) as u8);
                acc_bits -= 8;
            }
        }
        if acc_bits > 0 {
            out.push(((acc << (8 - acc_bits)) & 0xFF) as u8);
        }
        out
    }

    #[test]
    fn decodes_literal_run_then_eod() {
        // 'A' = 65, 'B' = 66, then EOD (257); all fit in 9 bits.
        let codes = [65, 66, EOD_CODE];
        let widths = [9, 9, 9];
        let compressed = encode_reference(&codes, &widths);
        let decoded = decode(&compressed, true).unwrap();
        assert_eq!(decoded, b"AB");
    }

    #[test]
    fn clear_code_resets_table() {
        let codes = [65, CLEAR_CODE, 66, EOD_CODE];
        let widths = [9, 9, 9, 9];
        let compressed = encode_reference(&codes, &widths);
        let decoded = decode(&compressed, true).unwrap();
        assert_eq!(decoded, b"AB");
    }

    #[test]
    fn rejects_code_referencing_unbuilt_table_entry() {
        let codes = [300u16];
        let widths = [9];
        let compressed = encode_reference(&codes, &widths);
        assert!(decode(&compressed, true).is_err());
    }
}
