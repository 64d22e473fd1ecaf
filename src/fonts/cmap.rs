//! ToUnicode CMap parser (§4.7): `beginbfchar`/`endbfchar` pairs and
//! `beginbfrange`/`endbfrange` blocks, in both the single-destination and
//! destination-array forms. Destinations are hex groups of 4 nibbles per
//! code point; anything decoding past `0x10FFFF` is dropped rather than
//! emitted, per the invariant in §4.7.

use crate::error::Result;
use regex::Regex;
use std::collections::HashMap;

/// A parsed ToUnicode CMap: character code -> Unicode text (usually one
/// `char`, sometimes a short ligature string).
#[derive(Debug, Clone, Default)]
pub struct CMap {
    map: HashMap<u32, String>,
}

impl CMap {
    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    fn insert(&mut self, code: u32, text: String) {
        self.map.entry(code).or_insert(text);
    }
}

/// Parse a decoded `/ToUnicode` CMap stream.
pub fn parse_tounicode_cmap(data: &[u8]) -> Result<CMap> {
    let mut cmap = CMap::default();
    let content = String::from_utf8_lossy(data);

    for section in extract_sections(&content, "beginbfchar", "endbfchar") {
        for line in section.lines() {
            if let Some((code, text)) = parse_bfchar_line(line) {
                cmap.insert(code, text);
            }
        }
    }

    for section in extract_sections(&content, "beginbfrange", "endbfrange") {
        for line in section.lines() {
            for (code, text) in parse_bfrange_line(line) {
                cmap.insert(code, text);
            }
        }
    }

    Ok(cmap)
}

fn extract_sections<'a>(content: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut sections = Vec::new();
    let mut remaining = content;
    while let Some(begin_pos) = remaining.find(begin) {
        let after_begin = &remaining[begin_pos + begin.len()..];
        match after_begin.find(end) {
            Some(end_pos) => {
                sections.push(&after_begin[..end_pos]);
                remaining = &after_begin[end_pos + end.len()..];
            },
            None => break,
        }
    }
    sections
}

fn bfchar_regex() -> &'static Regex {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    }
    &RE
}

fn bfrange_seq_regex() -> &'static Regex {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>").unwrap();
    }
    &RE
}

fn bfrange_array_regex() -> &'static Regex {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*\[((?:\s*<[0-9A-Fa-f]+>\s*)+)\]").unwrap();
    }
    &RE
}

fn hex_entry_regex() -> &'static Regex {
    lazy_static::lazy_static! {
        static ref RE: Regex = Regex::new(r"<([0-9A-Fa-f]+)>").unwrap();
    }
    &RE
}

fn parse_bfchar_line(line: &str) -> Option<(u32, String)> {
    let caps = bfchar_regex().captures(line)?;
    let code = u32::from_str_radix(&caps[1], 16).ok()?;
    let text = decode_dst_hex(&caps[2])?;
    Some((code, text))
}

fn parse_bfrange_line(line: &str) -> Vec<(u32, String)> {
    if let Some(caps) = bfrange_array_regex().captures(line) {
        let Some(start) = u32::from_str_radix(&caps[1], 16).ok() else { return Vec::new() };
        let Some(end) = u32::from_str_radix(&caps[2], 16).ok() else { return Vec::new() };
        let dsts: Vec<&str> = hex_entry_regex().captures_iter(&caps[3]).map(|c| c.get(1).unwrap().as_str()).collect();
        return (start..=end)
            .zip(dsts.iter())
            .filter_map(|(code, hex)| decode_dst_hex(hex).map(|text| (code, text)))
            .collect();
    }

    if let Some(caps) = bfrange_seq_regex().captures(line) {
        let Some(start) = u32::from_str_radix(&caps[1], 16).ok() else { return Vec::new() };
        let Some(end) = u32::from_str_radix(&caps[2], 16).ok() else { return Vec::new() };
        let Some(dst_start) = u32::from_str_radix(&caps[3], 16).ok() else { return Vec::new() };
        let range_size = end.saturating_sub(start).min(65535);
        return (0..=range_size)
            .filter_map(|offset| {
                let code = start.wrapping_add(offset);
                let dst = dst_start.wrapping_add(offset);
                if dst > 0x10FFFF {
                    return None;
                }
                char::from_u32(dst).map(|c| (code, c.to_string()))
            })
            .collect();
    }

    Vec::new()
}

/// Decode a destination hex string into Unicode text: 4 nibbles per code
/// point, concatenated (covers both single code points and ligatures).
/// Any code point past `0x10FFFF` drops the whole destination.
fn decode_dst_hex(hex: &str) -> Option<String> {
    if hex.len() % 4 != 0 || hex.is_empty() {
        return None;
    }
    let mut text = String::new();
    for chunk in hex.as_bytes().chunks(4) {
        let chunk = std::str::from_utf8(chunk).ok()?;
        let code = u32::from_str_radix(chunk, 16).ok()?;
        if code > 0x10FFFF {
            return None;
        }
        text.push(char::from_u32(code)?);
    }
    Some(text)
}
