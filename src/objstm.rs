//! Object stream parsing (§4.2 Compressed objects): a `/Type /ObjStm`
//! stream packs several object bodies into one decoded payload, preceded by
//! a header of `objNum offset` pairs. Object bodies have no `obj`/`endobj`
//! framing — parsing starts directly at the value.

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::object::Object;
use crate::xref::parse_dict_value;

/// One decoded `/Type /ObjStm` payload, with its header already parsed.
pub struct ObjectStream<'a> {
    payload: &'a [u8],
    /// (object number, byte offset relative to `/First`) pairs, in order.
    pub pairs: Vec<(u32, u32)>,
    first: u32,
}

impl<'a> ObjectStream<'a> {
    /// Parse the `N` header pairs out of a decoded ObjStm payload.
    /// `n` and `first` come from the stream's own dict (`/N`, `/First`).
    pub fn parse(payload: &'a [u8], n: u32, first: u32) -> Result<Self> {
        let mut lexer = Lexer::new(payload);
        let mut pairs = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let num = match lexer.next_token() {
                Token::Number(v) => v as u32,
                other => return Err(Error::parse(lexer.position(), format!("expected ObjStm object number, found {:?}", other))),
            };
            let off = match lexer.next_token() {
                Token::Number(v) => v as u32,
                other => return Err(Error::parse(lexer.position(), format!("expected ObjStm offset, found {:?}", other))),
            };
            pairs.push((num, off));
        }
        Ok(Self { payload, pairs, first })
    }

    /// Parse the object at index `i` (the `i`-th pair's offset into the
    /// payload, measured from `/First`).
    pub fn object_at_index(&self, i: usize) -> Result<Object> {
        let (_num, rel_offset) = *self.pairs.get(i).ok_or_else(|| Error::parse(0, format!("ObjStm index {} out of range", i)))?;
        let start = self.first as usize + rel_offset as usize;
        if start > self.payload.len() {
            return Err(Error::parse(start, "ObjStm object offset past end of payload"));
        }
        let mut lexer = Lexer::at(self.payload, start);
        parse_dict_value(&mut lexer)
    }

    /// Number of objects packed into this stream.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if the stream packs no objects.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
