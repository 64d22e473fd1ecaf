//! Font resolution and text decoding (§4.7): turns a page's font resource
//! dictionary into a decoder from content-stream byte strings to Unicode
//! text and glyph widths.

mod cmap;
mod encoding;
mod font_dict;
mod glyph_list;
mod tables;

pub use cmap::{parse_tounicode_cmap, CMap};
pub use encoding::SimpleEncoding;
pub use font_dict::{DecodedGlyph, FontInfo};
pub use tables::BaseEncoding;
