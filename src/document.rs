//! `PdfDocument` (§6): the top-level handle the rest of the crate is built
//! to serve. Owns the raw bytes and re-opens a [`Parser`] per call rather
//! than holding one across calls — `Parser<'a>` borrows the buffer it
//! parses, and Rust has no way to store a borrow of a sibling field inside
//! the same struct without unsafe code or an extra self-referential crate,
//! so each accessor opens, uses, and drops its own `Parser`.

use crate::annotations;
use crate::content;
use crate::converters;
use crate::error::{Error, Result};
use crate::layout;
use crate::metadata::Metadata;
use crate::object::{Dict, Object};
use crate::parser::Parser;
use crate::parser_config::LoadOptions;
use crate::primitives::Primitives;
use crate::text::{self, AssembledLine};
use std::path::Path;

/// US Letter width in points, used when a page (and its ancestors) carries
/// no `/MediaBox` at all.
const DEFAULT_PAGE_WIDTH: f32 = 612.0;

/// A page's dimensions, resolved by climbing `/Parent` for an inherited
/// `/MediaBox` if the page itself has none (§4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// Zero-based page index.
    pub index: usize,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
}

/// A loaded PDF document.
///
/// Cheap to construct multiple views from: `text`, `markdown`, and
/// `lines` each run the pipeline (object resolution → content-stream
/// interpretation → assembly → conversion) independently, so holding a
/// `PdfDocument` around and calling several of them re-walks the page tree
/// each time. That trade favors a simple, borrow-checker-friendly API over
/// a persistent object cache.
pub struct PdfDocument {
    bytes: Vec<u8>,
    primitives: Primitives,
    load_options: LoadOptions,
    page_count: usize,
    disposed: bool,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .field("disposed", &self.disposed)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

impl PdfDocument {
    /// Open a PDF from a file path, using default primitives and load
    /// options. The common case (§6).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::open_bytes(bytes)
    }

    /// Open a PDF already read into memory, using default primitives and
    /// load options.
    pub fn open_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::open_with_config(bytes, Primitives::default(), LoadOptions::default())
    }

    /// Open a PDF with explicit injected primitives and load options (§6,
    /// §10.3). Bootstraps the xref table once, just to establish the page
    /// count and surface a bootstrap failure immediately, then drops the
    /// `Parser` used to do so.
    pub fn open_with_config(bytes: Vec<u8>, primitives: Primitives, load_options: LoadOptions) -> Result<Self> {
        let page_count = {
            let mut parser = Parser::open(&bytes, primitives.clone(), load_options.password.as_deref())?;
            parser.pages()?.len()
        };
        Ok(Self { bytes, primitives, load_options, page_count, disposed: false })
    }

    /// Number of pages. Computed once at open time; disposal resets it to 0.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Release the document's underlying bytes. After disposal, every
    /// accessor returns an empty result rather than an error — there is
    /// nothing left to parse, but asking is not itself a mistake (§5
    /// "disposal").
    pub fn dispose(&mut self) {
        self.bytes.clear();
        self.bytes.shrink_to_fit();
        self.page_count = 0;
        self.disposed = true;
    }

    /// True once [`PdfDocument::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn with_parser<T>(&self, f: impl FnOnce(&mut Parser<'_>) -> Result<T>) -> Result<T> {
        let mut parser = Parser::open(&self.bytes, self.primitives.clone(), self.load_options.password.as_deref())?;
        f(&mut parser)
    }

    fn nth_page(parser: &mut Parser<'_>, index: usize) -> Result<Dict> {
        let pages = parser.pages()?;
        pages.into_iter().nth(index).ok_or_else(|| Error::parse(0, format!("page index {index} out of range")))
    }

    /// Plain text for a single page (§6, §4.8).
    pub fn page_text(&self, index: usize) -> Result<String> {
        if self.disposed {
            return Ok(String::new());
        }
        self.with_parser(|parser| {
            let page = Self::nth_page(parser, index)?;
            let runs = content::run_page(parser, &page, &self.load_options)?;
            Ok(text::assemble_text(&runs, &self.load_options))
        })
    }

    /// Plain text for the whole document: each page's text joined by
    /// [`LoadOptions::page_separator`], with empty pages skipped and
    /// per-page failures logged and skipped rather than aborting the whole
    /// document (§6, §7).
    pub fn text(&self) -> Result<String> {
        if self.disposed {
            return Ok(String::new());
        }
        let mut parts = Vec::new();
        for index in 0..self.page_count {
            match self.page_text(index) {
                Ok(page_text) if !page_text.is_empty() => parts.push(page_text),
                Ok(_) => {},
                Err(err) => log::warn!("page {index} failed to extract, skipping: {err}"),
            }
        }
        Ok(parts.join(&self.load_options.page_separator))
    }

    /// Structured lines for a single page (§6): reading-ordered
    /// [`AssembledLine`]s with link annotations attached.
    pub fn page_lines(&self, index: usize) -> Result<Vec<AssembledLine>> {
        if self.disposed {
            return Ok(Vec::new());
        }
        self.with_parser(|parser| {
            let page = Self::nth_page(parser, index)?;
            let runs = content::run_page(parser, &page, &self.load_options)?;
            let mut lines = text::assemble_lines(&runs, &self.load_options);
            let annots = annotations::collect_link_annotations(parser, &page);
            let rects = annotations::link_rects(&annots);
            text::attach_links(&mut lines, &rects);
            Ok(lines)
        })
    }

    /// Markdown for a single page (§6, §4.9, §4.10): assembled lines with
    /// detected tables substituted in.
    pub fn page_markdown(&self, index: usize) -> Result<String> {
        if self.disposed {
            return Ok(String::new());
        }
        self.with_parser(|parser| {
            let page = Self::nth_page(parser, index)?;
            let runs = content::run_page(parser, &page, &self.load_options)?;
            let mut lines = text::assemble_lines(&runs, &self.load_options);
            let annots = annotations::collect_link_annotations(parser, &page);
            let rects = annotations::link_rects(&annots);
            text::attach_links(&mut lines, &rects);
            let width = page_width(parser, &page);
            let tables = layout::detect_tables(&runs, width);
            Ok(converters::render_markdown(&lines, &tables))
        })
    }

    /// Markdown for the whole document, pages joined by
    /// [`LoadOptions::page_separator`] with the same per-page failure
    /// tolerance as [`PdfDocument::text`].
    pub fn markdown(&self) -> Result<String> {
        if self.disposed {
            return Ok(String::new());
        }
        let mut parts = Vec::new();
        for index in 0..self.page_count {
            match self.page_markdown(index) {
                Ok(page_md) if !page_md.is_empty() => parts.push(page_md),
                Ok(_) => {},
                Err(err) => log::warn!("page {index} failed to render, skipping: {err}"),
            }
        }
        Ok(parts.join(&self.load_options.page_separator))
    }

    /// Page dimensions, inherited from an ancestor `/Pages` node if the
    /// page itself carries no `/MediaBox`.
    pub fn page_info(&self, index: usize) -> Result<PageInfo> {
        if self.disposed {
            return Err(Error::parse(0, "document has been disposed"));
        }
        self.with_parser(|parser| {
            let page = Self::nth_page(parser, index)?;
            let width = page_width(parser, &page);
            let height = page_height(parser, &page);
            Ok(PageInfo { index, width, height })
        })
    }

    /// Document metadata from `/Info` (§6, §10.5). Empty once disposed.
    pub fn metadata(&self) -> Result<Metadata> {
        if self.disposed {
            return Ok(Metadata::default());
        }
        self.with_parser(|parser| Ok(crate::metadata::extract(parser, self.page_count)))
    }
}

/// Resolve a page's `/MediaBox`, climbing `/Parent` when absent (§4.5,
/// mirroring `content::interpreter::resolve_resources`'s inheritance walk).
/// Falls back to US Letter if no ancestor carries one.
fn resolve_media_box(parser: &mut Parser<'_>, page: &Dict) -> [f64; 4] {
    let mut current = page.clone();
    let mut visited = std::collections::HashSet::new();
    loop {
        if let Some(value) = current.get("MediaBox") {
            if let Some(rect) = parser.resolve(value).as_array().and_then(parse_rect_array) {
                return rect;
            }
        }
        match current.get("Parent") {
            Some(Object::Reference(r)) => {
                if !visited.insert((r.num, r.gen)) {
                    break;
                }
                match parser.resolve(&Object::Reference(*r)).as_dict() {
                    Some(d) => current = d.clone(),
                    None => break,
                }
            },
            _ => break,
        }
    }
    [0.0, 0.0, DEFAULT_PAGE_WIDTH as f64, 792.0]
}

fn parse_rect_array(arr: &[Object]) -> Option<[f64; 4]> {
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (i, v) in arr.iter().enumerate() {
        out[i] = v.as_f64()?;
    }
    Some(out)
}

fn page_width(parser: &mut Parser<'_>, page: &Dict) -> f32 {
    let mb = resolve_media_box(parser, page);
    (mb[2] - mb[0]).abs() as f32
}

fn page_height(parser: &mut Parser<'_>, page: &Dict) -> f32 {
    let mb = resolve_media_box(parser, page);
    (mb[3] - mb[1]).abs() as f32
}
