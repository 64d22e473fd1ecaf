//! Per-font decode and width tables (§4.7), assembled from a page's font
//! resource dictionary.

use super::cmap::{parse_tounicode_cmap, CMap};
use super::encoding::SimpleEncoding;
use crate::error::Result;
use crate::object::{Dict, Object};
use crate::parser::Parser;
use std::collections::HashMap;

/// One decoded glyph from a content-stream string: its text (possibly
/// empty for an unmapped code, possibly a ligature), its width in
/// thousandths of an em, and whether it's the ASCII space used for `Tw`.
pub struct DecodedGlyph {
    pub text: String,
    pub width: f64,
    pub is_space: bool,
}

#[derive(Debug)]
enum Widths {
    Cid { default: f64, table: HashMap<u32, f64> },
    Simple { first_char: u32, table: Vec<f64>, default: f64 },
}

/// A page font resource, resolved enough to decode content-stream strings
/// into text and widths.
#[derive(Debug)]
pub struct FontInfo {
    is_identity: bool,
    to_unicode: Option<CMap>,
    simple_encoding: Option<SimpleEncoding>,
    widths: Widths,
    /// `/BaseFont` name, carried through to emitted text runs.
    pub base_font: String,
}

impl FontInfo {
    /// Build from a `/Font` resource entry's dictionary. `parser` is used to
    /// chase `/ToUnicode`, `/DescendantFonts`, and `/FontDescriptor`.
    pub fn load(parser: &mut Parser<'_>, font_dict: &Dict) -> Result<Self> {
        let subtype = font_dict.get("Subtype").and_then(Object::as_name).unwrap_or("");
        let is_type0 = subtype == "Type0";
        let base_font = font_dict.get("BaseFont").and_then(Object::as_name).unwrap_or("").to_string();

        let to_unicode = match font_dict.get("ToUnicode") {
            Some(obj) => parser.resolve_stream(obj).ok().map(|data| parse_tounicode_cmap(&data)).transpose()?,
            None => None,
        };

        if is_type0 {
            let (default, table) = Self::load_cid_widths(parser, font_dict);
            Ok(Self { is_identity: true, to_unicode, simple_encoding: None, widths: Widths::Cid { default, table }, base_font })
        } else {
            let encoding = SimpleEncoding::resolve(font_dict.get("Encoding"));
            let (first_char, table, default) = Self::load_simple_widths(parser, font_dict);
            Ok(Self { is_identity: false, to_unicode, simple_encoding: Some(encoding), widths: Widths::Simple { first_char, table, default }, base_font })
        }
    }

    fn load_cid_widths(parser: &mut Parser<'_>, font_dict: &Dict) -> (f64, HashMap<u32, f64>) {
        let descendant = font_dict
            .get("DescendantFonts")
            .map(|obj| parser.resolve(obj))
            .and_then(|obj| obj.as_array().and_then(|a| a.first().cloned()))
            .map(|obj| parser.resolve(&obj));
        let descendant_dict = descendant.as_ref().and_then(Object::as_dict).cloned().unwrap_or_default();

        let missing_width = descendant_dict
            .get("FontDescriptor")
            .map(|obj| parser.resolve(obj))
            .and_then(|obj| obj.as_dict().and_then(|d| d.get("MissingWidth")).and_then(Object::as_f64));
        let dw = descendant_dict.get("DW").and_then(Object::as_f64).unwrap_or(1000.0);
        let default = missing_width.unwrap_or(dw);

        let mut table = HashMap::new();
        if let Some(w) = descendant_dict.get("W").map(|obj| parser.resolve(obj)) {
            if let Some(arr) = w.as_array() {
                parse_cid_width_array(arr, &mut table);
            }
        }
        (default, table)
    }

    fn load_simple_widths(parser: &mut Parser<'_>, font_dict: &Dict) -> (u32, Vec<f64>, f64) {
        let first_char = font_dict.get("FirstChar").and_then(Object::as_int).unwrap_or(0) as u32;
        let widths_obj = font_dict.get("Widths").map(|obj| parser.resolve(obj));
        let table: Vec<f64> = widths_obj.as_ref().and_then(Object::as_array).map(|a| a.iter().filter_map(Object::as_f64).collect()).unwrap_or_default();

        let missing_width = font_dict
            .get("FontDescriptor")
            .map(|obj| parser.resolve(obj))
            .and_then(|obj| obj.as_dict().and_then(|d| d.get("MissingWidth")).and_then(Object::as_f64));
        let mut default = missing_width.unwrap_or(600.0);

        // §4.7: if the default resolves to 0 but explicit widths exist,
        // substitute their mean rather than collapsing every unlisted
        // glyph to zero-width.
        if default == 0.0 && !table.is_empty() {
            default = table.iter().sum::<f64>() / table.len() as f64;
        }

        (first_char, table, default)
    }

    fn width_for(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Cid { default, table } => table.get(&code).copied().unwrap_or(*default),
            Widths::Simple { first_char, table, default } => {
                if code >= *first_char {
                    table.get((code - first_char) as usize).copied().unwrap_or(*default)
                } else {
                    *default
                }
            },
        }
    }

    /// Decode a content-stream string into glyphs, picking the first
    /// applicable rule from §4.7: ToUnicode, then Differences/base
    /// encoding, then identity, then raw ASCII passthrough.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        let codes = self.split_codes(bytes);
        codes.into_iter().map(|code| self.decode_code(code)).collect()
    }

    fn split_codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.is_identity {
            bytes.chunks(2).map(|chunk| if chunk.len() == 2 { u32::from(chunk[0]) << 8 | u32::from(chunk[1]) } else { u32::from(chunk[0]) << 8 }).collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    fn decode_code(&self, code: u32) -> DecodedGlyph {
        let width = self.width_for(code);
        let is_space = !self.is_identity && code == 0x20;

        if let Some(cmap) = &self.to_unicode {
            let text = cmap.get(code).map(str::to_string).or_else(|| (code >= 0x20).then(|| char::from_u32(code).map(|c| c.to_string())).flatten()).unwrap_or_default();
            return DecodedGlyph { text, width, is_space };
        }

        if let Some(encoding) = &self.simple_encoding {
            let text = encoding.decode_byte(code as u8).unwrap_or_default();
            return DecodedGlyph { text, width, is_space };
        }

        let text = if code >= 0x20 { char::from_u32(code).map(|c| c.to_string()).unwrap_or_default() } else { String::new() };
        DecodedGlyph { text, width, is_space }
    }
}

/// `/W` array: `c [w1 w2 ...]` (consecutive codes c, c+1, ... get w1, w2,
/// ...) or `c_first c_last w` (every code in the inclusive range gets w).
fn parse_cid_width_array(arr: &[Object], table: &mut HashMap<u32, f64>) {
    let mut i = 0;
    while i < arr.len() {
        let Some(c) = arr[i].as_int() else {
            i += 1;
            continue;
        };
        match arr.get(i + 1) {
            Some(Object::Array(widths)) => {
                for (offset, w) in widths.iter().enumerate() {
                    if let Some(w) = w.as_f64() {
                        table.insert(c as u32 + offset as u32, w);
                    }
                }
                i += 2;
            },
            Some(c_last) if c_last.as_int().is_some() => {
                let c_last = c_last.as_int().unwrap();
                let w = arr.get(i + 2).and_then(Object::as_f64).unwrap_or(1000.0);
                for code in c..=c_last {
                    table.insert(code as u32, w);
                }
                i += 3;
            },
            _ => i += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cid_width_array_form() {
        let arr = vec![Object::Number(10.0), Object::Array(vec![Object::Number(500.0), Object::Number(600.0)])];
        let mut table = HashMap::new();
        parse_cid_width_array(&arr, &mut table);
        assert_eq!(table.get(&10), Some(&500.0));
        assert_eq!(table.get(&11), Some(&600.0));
    }

    #[test]
    fn parses_cid_width_range_form() {
        let arr = vec![Object::Number(10.0), Object::Number(12.0), Object::Number(750.0)];
        let mut table = HashMap::new();
        parse_cid_width_array(&arr, &mut table);
        assert_eq!(table.get(&10), Some(&750.0));
        assert_eq!(table.get(&11), Some(&750.0));
        assert_eq!(table.get(&12), Some(&750.0));
    }

    #[test]
    fn out_of_range_code_falls_back_to_default_width() {
        let font = FontInfo {
            is_identity: false,
            to_unicode: None,
            simple_encoding: Some(SimpleEncoding::resolve(None)),
            widths: Widths::Simple { first_char: 0, table: vec![100.0, 200.0, 300.0], default: 200.0 },
            base_font: String::new(),
        };
        assert_eq!(font.width_for(99), 200.0);
        assert_eq!(font.width_for(1), 200.0);
    }

    #[test]
    fn identity_font_splits_two_byte_codes() {
        let font = FontInfo {
            is_identity: true,
            to_unicode: None,
            simple_encoding: None,
            widths: Widths::Cid { default: 1000.0, table: HashMap::new() },
            base_font: String::new(),
        };
        let glyphs = font.decode(&[0x00, 0x41, 0x00, 0x42]);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text, "A");
        assert_eq!(glyphs[1].text, "B");
    }

    #[test]
    fn simple_font_decodes_via_encoding_vector() {
        let font = FontInfo {
            is_identity: false,
            to_unicode: None,
            simple_encoding: Some(SimpleEncoding::resolve(None)),
            widths: Widths::Simple { first_char: 0, table: Vec::new(), default: 600.0 },
            base_font: String::new(),
        };
        let glyphs = font.decode(b"Hi");
        assert_eq!(glyphs[0].text, "H");
        assert_eq!(glyphs[1].text, "i");
    }

    #[test]
    fn space_code_flags_is_space_only_for_simple_fonts() {
        let font = FontInfo {
            is_identity: false,
            to_unicode: None,
            simple_encoding: Some(SimpleEncoding::resolve(None)),
            widths: Widths::Simple { first_char: 0, table: Vec::new(), default: 600.0 },
            base_font: String::new(),
        };
        let glyphs = font.decode(b" ");
        assert!(glyphs[0].is_space);
    }
}
