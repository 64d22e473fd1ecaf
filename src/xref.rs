//! Cross-reference table and cross-reference stream parsing (§4.2).
//!
//! This module understands the two on-disk representations of the xref
//! structure (classic tables and PDF 1.5+ xref streams) and produces a
//! uniform [`XRefEntry`] map plus a trailer dictionary. It does not decode
//! xref-stream payloads itself (that requires the filter pipeline, which
//! lives above this module) — callers decode the stream and hand the raw
//! bytes to [`parse_xref_stream_entries`].

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::object::{Dict, Object};
use std::collections::HashMap;

/// One cross-reference entry (§3/§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Not allocated, or freed; `next_free` chains to the next free slot.
    Free {
        /// Next free object number in the free list.
        next_free: u32,
    },
    /// Live object at a byte offset within the file.
    InUse {
        /// Byte offset of `num gen obj`.
        offset: u64,
        /// Generation number.
        gen: u16,
    },
    /// Live object packed into an object stream (§4.2 Compressed objects).
    Compressed {
        /// Object number of the containing `/Type /ObjStm` stream.
        stream_num: u32,
        /// Zero-based index of this object within the stream.
        index: u32,
    },
}

/// Object number → entry map, built up first-wins across `/Prev` chains
/// (§4.2: "merged first-wins" since newer sections are walked first).
#[derive(Debug, Clone, Default)]
pub struct XRefTable {
    entries: HashMap<u32, XRefEntry>,
}

impl XRefTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry.
    pub fn get(&self, num: u32) -> Option<XRefEntry> {
        self.entries.get(&num).copied()
    }

    /// Number of entries recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge in a batch of freshly-parsed entries, first-wins: an object
    /// number already present keeps its existing (newer) entry.
    pub fn merge_first_wins(&mut self, fresh: impl IntoIterator<Item = (u32, XRefEntry)>) {
        for (num, entry) in fresh {
            self.entries.entry(num).or_insert(entry);
        }
    }

    /// Directly record an entry, first-wins (used by the recovery scanner,
    /// §4.3).
    pub fn insert_first_wins(&mut self, num: u32, entry: XRefEntry) {
        self.entries.entry(num).or_insert(entry);
    }

    /// Iterate all (object number, entry) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&u32, &XRefEntry)> {
        self.entries.iter()
    }
}

/// Parse a classic (`xref` keyword) cross-reference table starting at
/// `offset`. Returns the parsed entries, the trailer dict that follows, and
/// the byte position just past the trailer dict.
pub fn parse_classic_table(buf: &[u8], offset: usize) -> Result<(Vec<(u32, XRefEntry)>, Dict, usize)> {
    let mut lexer = Lexer::at(buf, offset);
    match lexer.next_token() {
        Token::Keyword("xref") => {},
        other => return Err(Error::parse(offset, format!("expected 'xref' keyword, found {:?}", other))),
    }

    let mut entries = Vec::new();
    loop {
        let save = lexer.position();
        match lexer.next_token() {
            Token::Keyword("trailer") => break,
            Token::Number(first) => {
                let count = match lexer.next_token() {
                    Token::Number(n) => n as u32,
                    other => return Err(Error::parse(lexer.position(), format!("expected subsection count, found {:?}", other))),
                };
                let first = first as u32;
                for i in 0..count {
                    let entry = parse_classic_line(&mut lexer)?;
                    entries.push((first + i, entry));
                }
            },
            other => return Err(Error::parse(save, format!("expected subsection header or 'trailer', found {:?}", other))),
        }
    }

    let trailer = parse_dict(&mut lexer)?;
    Ok((entries, trailer, lexer.position()))
}

/// Parse one fixed-width classic xref line: `offset(10) gen(5) type`.
fn parse_classic_line(lexer: &mut Lexer<'_>) -> Result<XRefEntry> {
    let offset = match lexer.next_token() {
        Token::Number(n) => n as u64,
        other => return Err(Error::parse(lexer.position(), format!("expected xref offset, found {:?}", other))),
    };
    let gen = match lexer.next_token() {
        Token::Number(n) => n as u16,
        other => return Err(Error::parse(lexer.position(), format!("expected xref generation, found {:?}", other))),
    };
    match lexer.next_token() {
        Token::Keyword("n") => Ok(XRefEntry::InUse { offset, gen }),
        Token::Keyword("f") => Ok(XRefEntry::Free { next_free: offset as u32 }),
        other => Err(Error::parse(lexer.position(), format!("expected 'n' or 'f', found {:?}", other))),
    }
}

/// Parse a bare trailer dict at `offset` (no `trailer` keyword expected —
/// the caller has already consumed it). Used by the recovery scanner.
pub fn parse_trailer_only(buf: &[u8], offset: usize) -> Result<(Vec<(u32, XRefEntry)>, Dict, usize)> {
    let mut lexer = Lexer::at(buf, offset);
    let trailer = parse_dict(&mut lexer)?;
    Ok((Vec::new(), trailer, lexer.position()))
}

/// Parse a dictionary starting at the lexer's current position (used for
/// trailers; the generic object parser lives in `parser.rs`, but the
/// trailer is always a bare dict with no indirect object framing).
pub(crate) fn parse_dict(lexer: &mut Lexer<'_>) -> Result<Dict> {
    match lexer.next_token() {
        Token::DictStart => {},
        other => return Err(Error::parse(lexer.position(), format!("expected trailer dict, found {:?}", other))),
    }
    let mut dict = Dict::new();
    loop {
        match lexer.next_token() {
            Token::DictEnd => break,
            Token::Name(key) => {
                let value = parse_dict_value(lexer)?;
                crate::object::insert_first_wins(&mut dict, key, value);
            },
            other => return Err(Error::parse(lexer.position(), format!("expected name or '>>', found {:?}", other))),
        }
    }
    Ok(dict)
}

/// Parse a single scalar/array/dict value for trailer purposes (no indirect
/// references beyond a bare `num gen R`, and no stream bodies — trailers
/// never contain streams).
pub(crate) fn parse_dict_value(lexer: &mut Lexer<'_>) -> Result<Object> {
    let save = lexer.position();
    match lexer.next_token() {
        Token::Number(n) => {
            // Might be the start of `num gen R`.
            let after_num = lexer.position();
            if let Token::Number(gen) = lexer.next_token() {
                let after_gen = lexer.position();
                if let Token::Keyword("R") = lexer.next_token() {
                    return Ok(Object::Reference(crate::object::ObjectRef::new(n as u32, gen as u16)));
                }
                lexer.set_position(after_gen);
            }
            lexer.set_position(after_num);
            Ok(Object::Number(n))
        },
        Token::Name(s) => Ok(Object::Name(s)),
        Token::Bool(b) => Ok(Object::Boolean(b)),
        Token::Null => Ok(Object::Null),
        Token::LiteralString(raw) => Ok(Object::String(crate::lexer::decode_literal_string(raw))),
        Token::HexString(raw) => Ok(Object::String(crate::lexer::decode_hex_string(raw))),
        Token::ArrayStart => {
            let mut items = Vec::new();
            loop {
                let pos = lexer.position();
                match lexer.next_token() {
                    Token::ArrayEnd => break,
                    Token::Eof => return Err(Error::parse(pos, "unterminated array in trailer dict")),
                    _ => {
                        lexer.set_position(pos);
                        items.push(parse_dict_value(lexer)?);
                    },
                }
            }
            Ok(Object::Array(items))
        },
        Token::DictStart => {
            lexer.set_position(save);
            Ok(Object::Dictionary(parse_dict(lexer)?))
        },
        other => Err(Error::parse(save, format!("unexpected token in trailer value: {:?}", other))),
    }
}

/// Width of one xref-stream field in bytes, per `/W`.
fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | (*b as u64))
}

/// Parse the decoded payload of an xref stream (§4.2 Xref stream) into
/// entries. `w` is `/W`, `index` is the (first, count) pairs from `/Index`
/// (or `[(0, size)]` if absent).
pub fn parse_xref_stream_entries(payload: &[u8], w: [usize; 3], index: &[(u32, u32)]) -> Result<Vec<(u32, XRefEntry)>> {
    let record_len = w[0] + w[1] + w[2];
    if record_len == 0 {
        return Err(Error::parse(0, "xref stream has zero-width fields"));
    }
    let mut entries = Vec::new();
    let mut pos = 0usize;
    for &(first, count) in index {
        for i in 0..count {
            if pos + record_len > payload.len() {
                return Err(Error::parse(pos, "xref stream payload truncated"));
            }
            let mut off = 0;
            let f1 = if w[0] == 0 { 1 } else { read_be(&payload[pos..pos + w[0]]) };
            off += w[0];
            let f2 = read_be(&payload[pos + off..pos + off + w[1]]);
            off += w[1];
            let f3 = read_be(&payload[pos + off..pos + off + w[2]]);
            pos += record_len;

            let num = first + i;
            let entry = match f1 {
                0 => XRefEntry::Free { next_free: f2 as u32 },
                1 => XRefEntry::InUse { offset: f2, gen: f3 as u16 },
                2 => XRefEntry::Compressed { stream_num: f2 as u32, index: f3 as u32 },
                _ => continue, // unknown type field: skip per lenient parsing
            };
            entries.push((num, entry));
        }
    }
    Ok(entries)
}

/// Read `/Index` from a trailer-like dict, defaulting to `[(0, size)]`.
pub fn read_index(dict: &Dict, size: u32) -> Vec<(u32, u32)> {
    match dict.get("Index").and_then(Object::as_array) {
        Some(arr) => arr
            .chunks(2)
            .filter_map(|pair| match pair {
                [a, b] => Some((a.as_int()? as u32, b.as_int()? as u32)),
                _ => None,
            })
            .collect(),
        None => vec![(0, size)],
    }
}

/// Read `/W` as three field widths.
pub fn read_widths(dict: &Dict) -> Result<[usize; 3]> {
    let arr = dict.get("W").and_then(Object::as_array).ok_or_else(|| Error::parse(0, "xref stream missing /W"))?;
    if arr.len() != 3 {
        return Err(Error::parse(0, "/W must have exactly 3 entries"));
    }
    let mut w = [0usize; 3];
    for (i, item) in arr.iter().enumerate() {
        w[i] = item.as_int().ok_or_else(|| Error::parse(0, "/W entry is not a number"))? as usize;
    }
    Ok(w)
}
