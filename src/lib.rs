// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::wrong_self_convention)]
#![allow(clippy::explicit_counter_loop)]
#![allow(clippy::doc_overindented_list_items)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::redundant_guards)]
#![allow(clippy::regex_creation_in_loops)]
#![allow(clippy::manual_find)]
#![allow(clippy::match_like_matches_macro)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # pdfcrumb
//!
//! Dependency-light PDF text/Markdown extraction for RAG pipelines.
//!
//! ## What this crate does
//! - **Object model & xref resolution**: classic tables, xref streams,
//!   hybrid-reference files, and a full recovery scan when the primary path
//!   fails.
//! - **Stream decoding**: Flate (with a raw-deflate relaxed-mode fallback),
//!   ASCII85/ASCIIHex, LZW, and PNG/TIFF predictors.
//! - **Encryption**: Standard security handler, empty-password RC4/AES
//!   decryption.
//! - **Content-stream interpretation**: positioned text runs with font
//!   metrics, CID-to-Unicode mapping, and Form XObject recursion.
//! - **Reading-order assembly**: a 3-phase sort (y-cluster, text-object
//!   group, x-order) into lines and paragraphs, with bold/italic spans and
//!   link annotations attached.
//! - **Table detection and Markdown rendering**: aligned-row grouping and a
//!   GFM-compatible converter.
//!
//! Compression and cryptographic primitives are injected rather than
//! hard-wired (see [`primitives::Primitives`]), so a caller can swap in a
//! WASM-hosted zlib or a hardware MD5 without forking the parser.
//!
//! ## Quick start
//!
//! ```no_run
//! use pdfcrumb::PdfDocument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = PdfDocument::open("paper.pdf")?;
//! println!("{}", doc.text()?);
//! println!("{}", doc.markdown()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Core PDF parsing
pub mod document;
pub mod lexer;
pub mod metadata;
pub mod object;
pub mod objstm;
pub mod parser;
pub mod primitives;
/// Parser configuration options
pub mod parser_config;
pub mod xref;
pub mod xref_reconstruction;

// Stream decoders
pub mod decoders;

// Encryption support
pub mod encryption;

// Layout analysis
pub mod geometry;
pub mod layout;

// Text extraction
pub mod content;
pub mod fonts;
pub mod text;

// Document structure: link annotations only (§4.11)
pub mod annotations;

// Format converters
pub mod converters;

// Re-exports
pub use annotations::Annotation;
pub use document::{PageInfo, PdfDocument};
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use parser_config::LoadOptions;
pub use primitives::Primitives;

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // VERSION is populated from CARGO_PKG_VERSION at compile time
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdfcrumb");
    }
}
