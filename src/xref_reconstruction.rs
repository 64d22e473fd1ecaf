//! Recovery scan for PDFs whose xref structure is missing or unreadable
//! (§4.3). Two stages: reindex every `num gen obj` header found by brute
//! force, then locate (or synthesize) a trailer with `/Root`.

use crate::object::{Dict, Object};
use crate::xref::{XRefEntry, XRefTable};

/// Forward-scan `buf` for ` obj` markers and record an in-use entry for
/// each well-formed `num gen obj` header found, first-wins.
pub fn scan_for_objects(buf: &[u8]) -> XRefTable {
    let mut table = XRefTable::new();
    let needle = b" obj";
    let mut from = 0usize;
    while let Some(rel) = find(&buf[from..], needle) {
        let hit = from + rel;
        if let Some((num, gen, num_start)) = parse_obj_header_backwards(buf, hit) {
            table.insert_first_wins(num, XRefEntry::InUse { offset: num_start as u64, gen });
        }
        from = hit + needle.len();
    }
    table
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Walk backwards from the byte offset of ` obj` over `<ws><gen><ws><num>`
/// and return (num, gen, byte offset where `num` starts).
fn parse_obj_header_backwards(buf: &[u8], obj_kw_offset: usize) -> Option<(u32, u16, usize)> {
    let mut i = obj_kw_offset;
    i = skip_ws_backwards(buf, i);
    let gen_end = i;
    i = skip_digits_backwards(buf, i);
    let gen_start = i;
    if gen_start == gen_end {
        return None; // no generation digits
    }
    i = skip_ws_backwards(buf, i);
    let num_end = i;
    i = skip_digits_backwards(buf, i);
    let num_start = i;
    if num_start == num_end {
        return None; // no object-number digits
    }
    if num_start > 0 && !is_boundary(buf[num_start - 1]) {
        return None; // not actually at the start of a token
    }
    let gen: u16 = std::str::from_utf8(&buf[gen_start..gen_end]).ok()?.parse().ok()?;
    let num: u32 = std::str::from_utf8(&buf[num_start..num_end]).ok()?.parse().ok()?;
    Some((num, gen, num_start))
}

fn is_boundary(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

fn skip_ws_backwards(buf: &[u8], mut i: usize) -> usize {
    while i > 0 && is_boundary(buf[i - 1]) {
        i -= 1;
    }
    i
}

fn skip_digits_backwards(buf: &[u8], mut i: usize) -> usize {
    while i > 0 && buf[i - 1].is_ascii_digit() {
        i -= 1;
    }
    i
}

/// Forward-scan for a `trailer` keyword followed by a dict with `/Root`.
/// Falls back to promoting any recovered xref-stream-like or `/Root`-bearing
/// dict found among `recovered_dicts` if no explicit trailer qualifies.
pub fn find_trailer(buf: &[u8], recovered_dicts: &[Dict]) -> Option<Dict> {
    if let Some(dict) = scan_trailer_keyword(buf) {
        if dict.contains_key("Root") {
            return Some(dict);
        }
    }
    recovered_dicts
        .iter()
        .find(|d| d.contains_key("Root") || matches!(d.get("Type"), Some(Object::Name(n)) if n == "XRef"))
        .cloned()
}

fn scan_trailer_keyword(buf: &[u8]) -> Option<Dict> {
    let needle = b"trailer";
    let mut from = 0usize;
    let mut last_valid = None;
    while let Some(rel) = find(&buf[from..], needle) {
        let hit = from + rel;
        let after = hit + needle.len();
        if let Ok((_entries, dict, _pos)) = crate::xref::parse_trailer_only(buf, after) {
            last_valid = Some(dict);
        }
        from = after;
    }
    last_valid
}
