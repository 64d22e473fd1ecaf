//! `/Encoding` resolution (§4.7): a name selects one of the four standard
//! vectors; a dict layers `/Differences` (code -> glyph name, via the
//! Adobe Glyph List) on top of a `/BaseEncoding`.

use super::glyph_list::glyph_name_to_unicode;
use super::tables::BaseEncoding;
use crate::object::{Dict, Object};
use std::collections::HashMap;

/// A simple font's resolved encoding: the base 256-entry vector plus any
/// per-code overrides from `/Differences`.
#[derive(Debug, Clone)]
pub struct SimpleEncoding {
    base: BaseEncoding,
    differences: HashMap<u8, String>,
}

impl SimpleEncoding {
    /// Resolve `/Encoding` (a name, a dict, or absent — WinAnsi fallback
    /// per §4.7).
    pub fn resolve(encoding: Option<&Object>) -> Self {
        match encoding {
            Some(Object::Name(name)) => Self { base: BaseEncoding::from_name(name).unwrap_or(BaseEncoding::WinAnsi), differences: HashMap::new() },
            Some(Object::Dictionary(dict)) => Self::from_dict(dict),
            _ => Self { base: BaseEncoding::WinAnsi, differences: HashMap::new() },
        }
    }

    fn from_dict(dict: &Dict) -> Self {
        let base = dict.get("BaseEncoding").and_then(Object::as_name).and_then(BaseEncoding::from_name).unwrap_or(BaseEncoding::WinAnsi);
        let mut differences = HashMap::new();
        if let Some(arr) = dict.get("Differences").and_then(Object::as_array) {
            let mut code: u8 = 0;
            for item in arr {
                match item {
                    Object::Number(n) => code = *n as u8,
                    Object::Name(name) => {
                        differences.insert(code, name.clone());
                        code = code.saturating_add(1);
                    },
                    _ => {},
                }
            }
        }
        Self { base, differences }
    }

    /// Decode one byte: `/Differences` -> glyph name -> AGL first, then
    /// the base encoding vector, then ASCII passthrough for 0x20-0x7E.
    pub fn decode_byte(&self, byte: u8) -> Option<String> {
        if let Some(name) = self.differences.get(&byte) {
            if let Some(text) = glyph_name_to_unicode(name) {
                return Some(text);
            }
        }
        if let Some(ch) = self.base.decode_byte(byte) {
            return Some(ch.to_string());
        }
        if (0x20..=0x7E).contains(&byte) {
            return Some((byte as char).to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_encoding_selects_base_vector() {
        let enc = SimpleEncoding::resolve(Some(&Object::Name("MacRomanEncoding".into())));
        assert_eq!(enc.decode_byte(0x80), Some("\u{00C4}".to_string()));
    }

    #[test]
    fn absent_encoding_falls_back_to_winansi() {
        let enc = SimpleEncoding::resolve(None);
        assert_eq!(enc.decode_byte(0x80), Some("\u{20AC}".to_string()));
    }

    #[test]
    fn differences_override_base_vector() {
        let mut dict = Dict::new();
        dict.insert("BaseEncoding".into(), Object::Name("WinAnsiEncoding".into()));
        dict.insert("Differences".into(), Object::Array(vec![Object::Number(65.0), Object::Name("bullet".into())]));
        let enc = SimpleEncoding::resolve(Some(&Object::Dictionary(dict)));
        assert_eq!(enc.decode_byte(65), Some("\u{2022}".to_string()));
        assert_eq!(enc.decode_byte(66), Some("B".to_string()));
    }

    #[test]
    fn differences_sequence_increments_code() {
        let mut dict = Dict::new();
        dict.insert(
            "Differences".into(),
            Object::Array(vec![Object::Number(10.0), Object::Name("space".into()), Object::Name("exclam".into())]),
        );
        let enc = SimpleEncoding::resolve(Some(&Object::Dictionary(dict)));
        assert_eq!(enc.decode_byte(10), Some(" ".to_string()));
        assert_eq!(enc.decode_byte(11), Some("!".to_string()));
    }
}
