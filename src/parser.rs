//! The object resolver (§4.2): bootstraps from `startxref`, walks classic
//! tables and xref streams along the `/Prev` chain, falls back to a full
//! recovery scan (§4.3) when that fails, and resolves indirect references
//! on demand with a cache and a recursion depth cap.

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::object::{Dict, Object, ObjectRef};
use crate::primitives::Primitives;
use crate::xref::{self, XRefEntry, XRefTable};
use std::collections::{HashMap, HashSet};

const MAX_RESOLVE_DEPTH: u32 = 100;

/// Owns the document's byte buffer, its xref table, the object cache, and
/// (if present) the decryption context. This is the mid-level layer the
/// public `PdfDocument` API is built on top of.
pub struct Parser<'a> {
    buf: &'a [u8],
    xref: XRefTable,
    cache: HashMap<(u32, u16), Object>,
    primitives: Primitives,
    encryption: Option<crate::encryption::EncryptionContext>,
    trailer: Dict,
}

impl<'a> Parser<'a> {
    /// Bootstrap (§4.2 Bootstrap): locate the xref structure, fall back to
    /// a recovery scan if needed, require `/Root`, and unlock encryption
    /// with an empty password if `/Encrypt` is present.
    pub fn open(buf: &'a [u8], primitives: Primitives, password: Option<&str>) -> Result<Self> {
        let mut parser = Parser { buf, xref: XRefTable::new(), cache: HashMap::new(), primitives, encryption: None, trailer: Dict::new() };

        if parser.bootstrap_xref().is_err() || !parser.trailer.contains_key("Root") {
            log::warn!("xref bootstrap failed or missing /Root, falling back to recovery scan");
            parser.recover()?;
        }

        if !parser.trailer.contains_key("Root") {
            return Err(Error::parse(0, "no /Root found after xref parse and recovery scan"));
        }

        if let Some(encrypt) = parser.trailer.get("Encrypt").cloned() {
            let encrypt_dict = parser.resolve(&encrypt);
            let encrypt_dict = encrypt_dict.as_dict().cloned().ok_or_else(|| Error::parse(0, "/Encrypt is not a dictionary"))?;
            let id0 = parser
                .trailer
                .get("ID")
                .and_then(Object::as_array)
                .and_then(|arr| arr.first())
                .and_then(Object::as_string_bytes)
                .ok_or_else(|| Error::unsupported("encrypted PDF missing /ID[0]"))?
                .to_vec();
            log::debug!("document is encrypted, attempting authentication");
            parser.encryption = Some(crate::encryption::EncryptionContext::authenticate(&encrypt_dict, &id0, password.unwrap_or(""), &parser.primitives)?);
        }

        Ok(parser)
    }

    /// The merged trailer dict (first-wins across the `/Prev` chain).
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    fn bootstrap_xref(&mut self) -> Result<()> {
        let startxref_pos = self.buf_find_last(b"startxref").ok_or_else(|| Error::parse(0, "no startxref marker found"))?;
        let mut lexer = Lexer::at(self.buf, startxref_pos + b"startxref".len());
        let offset = match lexer.next_token() {
            Token::Number(n) => n as usize,
            other => return Err(Error::parse(lexer.position(), format!("expected startxref offset, found {:?}", other))),
        };
        let mut visited = HashSet::new();
        self.parse_xref_chain(offset, &mut visited)
    }

    fn parse_xref_chain(&mut self, offset: usize, visited: &mut HashSet<usize>) -> Result<()> {
        if !visited.insert(offset) {
            return Ok(()); // cyclic /Prev chain, stop silently
        }
        let trailer = self.parse_xref_at(offset)?;
        for (key, value) in trailer.iter() {
            crate::object::insert_first_wins(&mut self.trailer, key.clone(), value.clone());
        }
        if let Some(prev) = trailer.get("Prev").and_then(Object::as_int) {
            self.parse_xref_chain(prev as usize, visited)?;
        }
        if let Some(xrefstm) = trailer.get("XRefStm").and_then(Object::as_int) {
            // Hybrid-reference file (§4.2): a classic table pointing at a
            // companion xref stream for compressed-object entries.
            self.parse_xref_chain(xrefstm as usize, visited)?;
        }
        Ok(())
    }

    /// `parse_xref_at(offset)` (§4.2): dispatch on the token at `offset`.
    fn parse_xref_at(&mut self, offset: usize) -> Result<Dict> {
        let first_token_pos = {
            let mut lexer = Lexer::at(self.buf, offset);
            let tok = lexer.next_token();
            (tok, lexer.position())
        };
        match first_token_pos.0 {
            Token::Keyword("xref") => {
                let (entries, trailer, _pos) = xref::parse_classic_table(self.buf, offset)?;
                self.xref.merge_first_wins(entries);
                Ok(trailer)
            },
            Token::Number(_) => self.parse_xref_stream_at(offset),
            other => Err(Error::parse(offset, format!("expected 'xref' or object number, found {:?}", other))),
        }
    }

    fn parse_xref_stream_at(&mut self, offset: usize) -> Result<Dict> {
        let obj = self.parse_object_at(offset)?;
        let (dict, data) = obj.as_stream().ok_or_else(|| Error::parse(offset, "xref stream object is not a stream"))?;
        let (dict, data) = (dict.clone(), data.to_vec());
        let decoded = self.decode_stream_object(&dict, &data)?;
        let size = dict.get("Size").and_then(Object::as_int).ok_or_else(|| Error::parse(offset, "xref stream missing /Size"))? as u32;
        let w = xref::read_widths(&dict)?;
        let index = xref::read_index(&dict, size);
        let entries = xref::parse_xref_stream_entries(&decoded, w, &index)?;
        self.xref.merge_first_wins(entries);
        Ok(dict)
    }

    /// Recovery scan (§4.3): rebuild the xref table and trailer from scratch.
    fn recover(&mut self) -> Result<()> {
        self.xref = crate::xref_reconstruction::scan_for_objects(self.buf);
        let mut recovered_dicts = Vec::new();
        let nums: Vec<u32> = self.xref.iter().map(|(n, _)| *n).collect();
        for num in nums {
            if let Some(XRefEntry::InUse { offset, .. }) = self.xref.get(num) {
                if let Ok(obj) = self.parse_object_at(offset as usize) {
                    if let Some(d) = obj.as_dict() {
                        recovered_dicts.push(d.clone());
                    }
                }
            }
        }
        if let Some(trailer) = crate::xref_reconstruction::find_trailer(self.buf, &recovered_dicts) {
            self.trailer = trailer;
        }
        Ok(())
    }

    fn buf_find_last(&self, needle: &[u8]) -> Option<usize> {
        Lexer::new(self.buf).find_last(needle)
    }

    /// Parse an indirect object body at a known byte offset: `num gen obj
    /// <value> [stream ... endstream] endobj`.
    fn parse_object_at(&mut self, offset: usize) -> Result<Object> {
        let mut lexer = Lexer::at(self.buf, offset);
        match lexer.next_token() {
            Token::Number(_) => {},
            other => return Err(Error::parse(offset, format!("expected object number, found {:?}", other))),
        }
        match lexer.next_token() {
            Token::Number(_) => {},
            other => return Err(Error::parse(offset, format!("expected generation number, found {:?}", other))),
        }
        match lexer.next_token() {
            Token::Keyword("obj") => {},
            other => return Err(Error::parse(offset, format!("expected 'obj' keyword, found {:?}", other))),
        }

        let value = xref::parse_dict_value(&mut lexer)?;

        if let Object::Dictionary(dict) = value {
            let after_dict = lexer.position();
            if let Token::Keyword("stream") = lexer.next_token() {
                consume_single_eol(&mut lexer);
                let data_start = lexer.position();
                let data_end = match self.resolve_length(&dict)? {
                    Some(len) => data_start + len,
                    None => {
                        let found = lexer.find_next(b"endstream", data_start).unwrap_or(self.buf.len());
                        trim_trailing_eol(self.buf, data_start, found)
                    },
                };
                let data_end = data_end.min(self.buf.len());
                let data = self.buf[data_start..data_end].to_vec();
                return Ok(Object::Stream { dict, data });
            }
            lexer.set_position(after_dict);
            return Ok(Object::Dictionary(dict));
        }
        Ok(value)
    }

    /// `/Length` may be an indirect reference; resolve it by parsing the
    /// target object directly at its xref offset, without going through the
    /// cache/depth-capped resolver (§4.2).
    fn resolve_length(&mut self, dict: &Dict) -> Result<Option<usize>> {
        match dict.get("Length") {
            None => Ok(None),
            Some(Object::Number(n)) => Ok(Some(*n as usize)),
            Some(Object::Reference(r)) => match self.xref.get(r.num) {
                Some(XRefEntry::InUse { offset, .. }) => match self.parse_object_at(offset as usize) {
                    Ok(obj) => Ok(obj.as_int().map(|n| n as usize)),
                    Err(_) => Ok(None),
                },
                _ => Ok(None),
            },
            Some(_) => Ok(None),
        }
    }

    /// `resolve(obj)` (§4.2): follow one indirect reference (recursively,
    /// capped), consulting and populating the cache.
    pub fn resolve(&mut self, obj: &Object) -> Object {
        self.resolve_depth(obj, 0)
    }

    fn resolve_depth(&mut self, obj: &Object, depth: u32) -> Object {
        let r = match obj {
            Object::Reference(r) => *r,
            other => return other.clone(),
        };
        if depth >= MAX_RESOLVE_DEPTH {
            return Object::Null;
        }
        if let Some(cached) = self.cache.get(&(r.num, r.gen)) {
            return cached.clone();
        }
        let resolved = self.parse_and_decrypt(r).unwrap_or(Object::Null);
        let resolved = if matches!(resolved, Object::Reference(_)) { self.resolve_depth(&resolved, depth + 1) } else { resolved };
        self.cache.insert((r.num, r.gen), resolved.clone());
        resolved
    }

    fn parse_and_decrypt(&mut self, r: ObjectRef) -> Result<Object> {
        match self.xref.get(r.num) {
            Some(XRefEntry::InUse { offset, gen }) => {
                let obj = self.parse_object_at(offset as usize)?;
                match &self.encryption {
                    Some(ctx) => ctx.decrypt_object(obj, r.num, gen),
                    None => Ok(obj),
                }
            },
            Some(XRefEntry::Compressed { stream_num, index }) => self.resolve_compressed(stream_num, index),
            Some(XRefEntry::Free { .. }) | None => Err(Error::ObjectNotFound(r.num, r.gen)),
        }
    }

    /// Look up a compressed object (§4.2 Compressed objects). Compressed
    /// objects are never themselves encrypted.
    fn resolve_compressed(&mut self, stream_num: u32, index: u32) -> Result<Object> {
        let offset = match self.xref.get(stream_num) {
            Some(XRefEntry::InUse { offset, .. }) => offset,
            _ => return Err(Error::ObjectNotFound(stream_num, 0)),
        };
        let stream_obj = self.parse_object_at(offset as usize)?;
        let (dict, data) = stream_obj.as_stream().ok_or_else(|| Error::parse(offset as usize, "ObjStm object is not a stream"))?;
        let (dict, data) = (dict.clone(), data.to_vec());
        let decoded = self.decode_stream_object(&dict, &data)?;
        let n = dict.get("N").and_then(Object::as_int).ok_or_else(|| Error::parse(offset as usize, "ObjStm missing /N"))? as u32;
        let first = dict.get("First").and_then(Object::as_int).ok_or_else(|| Error::parse(offset as usize, "ObjStm missing /First"))? as u32;
        let objstm = crate::objstm::ObjectStream::parse(&decoded, n, first)?;
        objstm.object_at_index(index as usize)
    }

    /// Decode a stream's payload through the filter pipeline (§4.4),
    /// resolving any indirect `/Filter`/`/DecodeParms` entries first.
    fn decode_stream_object(&mut self, dict: &Dict, data: &[u8]) -> Result<Vec<u8>> {
        let filters = self.resolve_filter_names(dict)?;
        let parms = self.resolve_decode_parms(dict, filters.len())?;
        crate::decoders::decode_stream(data, &filters, &parms, &self.primitives)
    }

    fn resolve_filter_names(&mut self, dict: &Dict) -> Result<Vec<String>> {
        let filter = match dict.get("Filter") {
            None => return Ok(Vec::new()),
            Some(f) => f.clone(),
        };
        let resolved = self.resolve(&filter);
        match resolved {
            Object::Name(n) => Ok(vec![n]),
            Object::Array(items) => items
                .into_iter()
                .map(|it| {
                    let r = self.resolve(&it);
                    r.as_name().map(|s| s.to_string()).ok_or_else(|| Error::parse(0, "non-Name entry in /Filter array"))
                })
                .collect(),
            Object::Null => Ok(Vec::new()),
            _ => Err(Error::parse(0, "/Filter is neither a Name nor an Array")),
        }
    }

    fn resolve_decode_parms(&mut self, dict: &Dict, filter_count: usize) -> Result<Vec<Option<Dict>>> {
        let parms = match dict.get("DecodeParms").or_else(|| dict.get("DP")) {
            None => return Ok(vec![None; filter_count]),
            Some(p) => p.clone(),
        };
        let resolved = self.resolve(&parms);
        match resolved {
            Object::Dictionary(d) => Ok(vec![Some(d)]),
            Object::Array(items) => Ok(items
                .into_iter()
                .map(|it| self.resolve(&it).as_dict().cloned())
                .collect()),
            Object::Null => Ok(vec![None; filter_count]),
            _ => Err(Error::parse(0, "/DecodeParms is neither a Dictionary nor an Array")),
        }
    }

    /// Resolve `obj` and, if it lands on a stream, decode its filter
    /// pipeline and return the payload. Used by the font and content-stream
    /// layers, which only need a stream's bytes and don't care about the
    /// resolver's internals.
    pub fn resolve_stream(&mut self, obj: &Object) -> Result<Vec<u8>> {
        let resolved = self.resolve(obj);
        let (dict, data) = resolved.as_stream().ok_or_else(|| Error::parse(0, "expected a stream object"))?;
        let (dict, data) = (dict.clone(), data.to_vec());
        self.decode_stream_object(&dict, &data)
    }

    /// `/Root` dict, resolved.
    pub fn catalog(&mut self) -> Result<Dict> {
        let root = self.trailer.get("Root").cloned().ok_or_else(|| Error::parse(0, "missing /Root"))?;
        self.resolve(&root).as_dict().cloned().ok_or_else(|| Error::parse(0, "/Root is not a dictionary"))
    }

    /// Walk `/Root → /Pages → /Kids` collecting `/Type /Page` leaves in
    /// traversal order (§4.2 Catalog/Pages). Cycle-safe via a visited set on
    /// object numbers.
    pub fn pages(&mut self) -> Result<Vec<Dict>> {
        let catalog = self.catalog()?;
        let pages_ref = catalog.get("Pages").cloned().ok_or_else(|| Error::parse(0, "/Root missing /Pages"))?;
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.walk_pages(&pages_ref, &mut out, &mut visited)?;
        Ok(out)
    }

    fn walk_pages(&mut self, node: &Object, out: &mut Vec<Dict>, visited: &mut HashSet<(u32, u16)>) -> Result<()> {
        if let Object::Reference(r) = node {
            if !visited.insert((r.num, r.gen)) {
                return Ok(()); // cyclic /Kids, stop
            }
        }
        let resolved = self.resolve(node);
        let dict = match resolved.as_dict() {
            Some(d) => d.clone(),
            None => return Ok(()),
        };
        let is_pages = matches!(dict.get("Type"), Some(Object::Name(n)) if n == "Pages") || dict.contains_key("Kids");
        if is_pages {
            if let Some(kids) = dict.get("Kids").and_then(Object::as_array) {
                for kid in kids.to_vec() {
                    self.walk_pages(&kid, out, visited)?;
                }
            }
        } else {
            out.push(dict);
        }
        Ok(())
    }
}

fn consume_single_eol(lexer: &mut Lexer<'_>) {
    let buf = lexer.buffer();
    let pos = lexer.position();
    match buf.get(pos) {
        Some(b'\r') if buf.get(pos + 1) == Some(&b'\n') => lexer.set_position(pos + 2),
        Some(b'\r') | Some(b'\n') => lexer.set_position(pos + 1),
        _ => {},
    }
}

/// If the byte just before `end` is LF (optionally preceded by CR), trim it
/// from the stream payload (§4.2: "trimming up to one trailing CR/LF byte").
fn trim_trailing_eol(buf: &[u8], start: usize, end: usize) -> usize {
    if end == start {
        return end;
    }
    let mut e = end;
    if buf.get(e - 1) == Some(&b'\n') {
        e -= 1;
        if e > start && buf.get(e - 1) == Some(&b'\r') {
            e -= 1;
        }
    } else if buf.get(e - 1) == Some(&b'\r') {
        e -= 1;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Primitives;

    fn minimal_pdf() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let obj1_off = buf.len();
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2_off = buf.len();
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
        let obj3_off = buf.len();
        buf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n");
        let xref_off = buf.len();
        buf.extend_from_slice(format!("xref\n0 4\n0000000000 65535 f \n{:010} 00000 n \n{:010} 00000 n \n{:010} 00000 n \ntrailer\n<< /Size 4 /Root 1 0 R >>\n", obj1_off, obj2_off, obj3_off).as_bytes());
        buf.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());
        buf
    }

    #[test]
    fn bootstraps_and_walks_pages() {
        let buf = minimal_pdf();
        let mut parser = Parser::open(&buf, Primitives::default(), None).unwrap();
        let pages = parser.pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].get("Type").unwrap().as_name(), Some("Page"));
    }

    #[test]
    fn recovers_when_startxref_is_garbage() {
        let mut buf = minimal_pdf();
        // Corrupt the startxref offset so the primary path fails.
        let pos = buf.windows(b"startxref\n".len()).position(|w| w == b"startxref\n").unwrap();
        let after = pos + b"startxref\n".len();
        for b in buf[after..after + 2].iter_mut() {
            *b = b'9';
        }
        let mut parser = Parser::open(&buf, Primitives::default(), None).unwrap();
        let pages = parser.pages().unwrap();
        assert_eq!(pages.len(), 1);
    }
}
