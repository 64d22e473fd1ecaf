//! Text assembly (§4.8): turns the positioned [`crate::content::TextRun`]s
//! a page's content stream produced into reading-ordered lines.

pub mod assembler;

pub use assembler::{assemble_lines, assemble_text, attach_links, AssembledLine, LinkRect, Span};
