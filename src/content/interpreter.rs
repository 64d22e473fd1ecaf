//! Content-stream interpreter (§4.5): walks a page's (or a Form XObject's)
//! operator sequence against a graphics-state stack and a resolved font
//! map, emitting positioned text runs.

use crate::content::graphics_state::{GraphicsState, GraphicsStateStack, Matrix};
use crate::content::operators::{Operator, TextElement};
use crate::content::parser::parse_content_stream;
use crate::error::Result;
use crate::fonts::FontInfo;
use crate::object::{Dict, Object, ObjectRef};
use crate::parser::Parser;
use crate::parser_config::LoadOptions;
use std::collections::HashMap;
use std::rc::Rc;

/// Form XObject recursion is capped at this depth (§4.5).
const MAX_FORM_DEPTH: u32 = 10;

/// A positioned run of decoded text (§4.5 "Run emission").
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Decoded Unicode text.
    pub text: String,
    /// Device-space x of the run's origin.
    pub x: f32,
    /// Device-space y of the run's origin.
    pub y: f32,
    /// Effective font size, scaled by the text matrix.
    pub font_size: f32,
    /// `/BaseFont` name of the font the run was drawn with.
    pub base_font: String,
    /// Rendered width in device space.
    pub width: f32,
    /// Id of the `BT`/`ET` text object this run was drawn inside, so the
    /// assembler can group runs by text object before falling back to
    /// geometry.
    pub text_object_id: u32,
}

/// Run the interpreter over a page's content streams and return the text
/// runs it drew (§4.5).
pub fn run_page(parser: &mut Parser<'_>, page: &Dict, options: &LoadOptions) -> Result<Vec<TextRun>> {
    let resources = resolve_resources(parser, page);
    let content = page_content_bytes(parser, page);
    let mut interp = Interpreter { parser, runs: Vec::new(), text_object_id: 0, font_cache: HashMap::new(), options };
    let mut stack = GraphicsStateStack::new();
    interp.execute(&content, &resources, &mut stack, 0);
    Ok(interp.runs)
}

/// Walk `/Resources`, climbing `/Parent` if a page (or its ancestors) omits
/// it (§4.5). Cycle-safe.
fn resolve_resources(parser: &mut Parser<'_>, page: &Dict) -> Dict {
    let mut current = page.clone();
    let mut visited = std::collections::HashSet::new();
    loop {
        if let Some(res) = current.get("Resources") {
            if let Some(d) = parser.resolve(res).as_dict() {
                return d.clone();
            }
        }
        match current.get("Parent") {
            Some(Object::Reference(r)) => {
                if !visited.insert((r.num, r.gen)) {
                    return Dict::new();
                }
                match parser.resolve(&Object::Reference(*r)).as_dict() {
                    Some(d) => current = d.clone(),
                    None => return Dict::new(),
                }
            },
            _ => return Dict::new(),
        }
    }
}

/// Concatenate a page's `/Contents`: a single stream, or an array of
/// streams joined with a newline (§4.5).
fn page_content_bytes(parser: &mut Parser<'_>, page: &Dict) -> Vec<u8> {
    let Some(contents) = page.get("Contents") else { return Vec::new() };
    let resolved = parser.resolve(contents);
    match &resolved {
        Object::Array(items) => {
            let items = items.clone();
            let mut buf = Vec::new();
            for item in items {
                if let Ok(data) = parser.resolve_stream(&item) {
                    buf.extend_from_slice(&data);
                    buf.push(b'\n');
                }
            }
            buf
        },
        Object::Stream { .. } => parser.resolve_stream(&resolved).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Shallow resource-dictionary overlay (§4.5 "merging Form resources over
/// parent"): each top-level category (`/Font`, `/XObject`, ...) present in
/// `child` fully replaces the same category in `parent`.
fn merge_resources(parent: &Dict, child: &Dict) -> Dict {
    let mut merged = parent.clone();
    for (key, value) in child {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn matrix_from_array(arr: &[Object]) -> Matrix {
    let v: Vec<f32> = arr.iter().filter_map(Object::as_f64).map(|n| n as f32).collect();
    match v.as_slice() {
        [a, b, c, d, e, f] => Matrix { a: *a, b: *b, c: *c, d: *d, e: *e, f: *f },
        _ => Matrix::identity(),
    }
}

struct Interpreter<'p, 'a> {
    parser: &'p mut Parser<'a>,
    runs: Vec<TextRun>,
    text_object_id: u32,
    font_cache: HashMap<ObjectRef, Rc<FontInfo>>,
    options: &'p LoadOptions,
}

impl<'p, 'a> Interpreter<'p, 'a> {
    fn execute(&mut self, data: &[u8], resources: &Dict, stack: &mut GraphicsStateStack, depth: u32) {
        for op in parse_content_stream(data) {
            match op {
                Operator::BeginText => {
                    let gs = stack.current_mut();
                    gs.text_matrix = Matrix::identity();
                    gs.text_line_matrix = Matrix::identity();
                    self.text_object_id += 1;
                },
                Operator::EndText => {},
                Operator::SetCharSpace(v) => stack.current_mut().char_space = v,
                Operator::SetWordSpace(v) => stack.current_mut().word_space = v,
                Operator::SetHorizontalScaling(v) => stack.current_mut().horizontal_scaling = v,
                Operator::SetLeading(v) => stack.current_mut().leading = v,
                Operator::SetTextRise(v) => stack.current_mut().text_rise = v,
                Operator::SetRenderMode(v) => stack.current_mut().render_mode = v,
                Operator::SetFont { name, size } => {
                    let font = self.load_font(resources, &name);
                    let gs = stack.current_mut();
                    gs.font_name = Some(name);
                    gs.font_size = size;
                    gs.current_font = font;
                },
                Operator::MoveText { tx, ty } => {
                    let gs = stack.current_mut();
                    gs.text_line_matrix = Matrix::translation(tx, ty).multiply(&gs.text_line_matrix);
                    gs.text_matrix = gs.text_line_matrix;
                },
                Operator::MoveTextSetLeading { tx, ty } => {
                    let gs = stack.current_mut();
                    gs.leading = -ty;
                    gs.text_line_matrix = Matrix::translation(tx, ty).multiply(&gs.text_line_matrix);
                    gs.text_matrix = gs.text_line_matrix;
                },
                Operator::SetTextMatrix { a, b, c, d, e, f } => {
                    let gs = stack.current_mut();
                    gs.text_matrix = Matrix { a, b, c, d, e, f };
                    gs.text_line_matrix = gs.text_matrix;
                },
                Operator::NextLine => {
                    let gs = stack.current_mut();
                    gs.text_line_matrix = Matrix::translation(0.0, -gs.leading).multiply(&gs.text_line_matrix);
                    gs.text_matrix = gs.text_line_matrix;
                },
                Operator::ShowText(bytes) => self.emit_run(stack.current_mut(), &bytes),
                Operator::ShowTextArray(elements) => {
                    for el in elements {
                        match el {
                            TextElement::Text(bytes) => self.emit_run(stack.current_mut(), &bytes),
                            TextElement::Adjustment(n) => {
                                let gs = stack.current_mut();
                                gs.text_matrix.e -= (n / 1000.0) * gs.font_size * (gs.horizontal_scaling / 100.0);
                            },
                        }
                    }
                },
                Operator::NextLineShowText(bytes) => {
                    {
                        let gs = stack.current_mut();
                        gs.text_line_matrix = Matrix::translation(0.0, -gs.leading).multiply(&gs.text_line_matrix);
                        gs.text_matrix = gs.text_line_matrix;
                    }
                    self.emit_run(stack.current_mut(), &bytes);
                },
                Operator::SetSpacingShowText { word_space, char_space, text } => {
                    {
                        let gs = stack.current_mut();
                        gs.word_space = word_space;
                        gs.char_space = char_space;
                        gs.text_line_matrix = Matrix::translation(0.0, -gs.leading).multiply(&gs.text_line_matrix);
                        gs.text_matrix = gs.text_line_matrix;
                    }
                    self.emit_run(stack.current_mut(), &text);
                },
                Operator::SaveState => stack.save(),
                Operator::RestoreState => stack.restore(),
                Operator::ConcatMatrix { a, b, c, d, e, f } => {
                    let gs = stack.current_mut();
                    gs.ctm = (Matrix { a, b, c, d, e, f }).multiply(&gs.ctm);
                },
                Operator::PaintXObject(name) => self.handle_do(stack, resources, &name, depth),
                Operator::SetExtGState(name) => self.apply_ext_gstate(stack, resources, &name),
                Operator::Other { .. } => {},
            }
        }
    }

    fn apply_ext_gstate(&mut self, stack: &mut GraphicsStateStack, resources: &Dict, name: &str) {
        let Some(obj) = resources.get("ExtGState") else { return };
        let Some(dict) = self.parser.resolve(obj).as_dict().cloned() else { return };
        let Some(entry) = dict.get(name).cloned() else { return };
        let Some(entry_dict) = self.parser.resolve(&entry).as_dict().cloned() else { return };
        let Some(font_arr) = entry_dict.get("Font").and_then(Object::as_array).map(<[Object]>::to_vec) else { return };
        let Some(font_ref) = font_arr.first().cloned() else { return };
        let size = font_arr.get(1).and_then(Object::as_f64).unwrap_or(stack.current().font_size as f64) as f32;
        if let Some(font) = self.load_font_by_ref(&font_ref) {
            let gs = stack.current_mut();
            gs.current_font = Some(font);
            gs.font_size = size;
        }
    }

    fn handle_do(&mut self, stack: &mut GraphicsStateStack, resources: &Dict, name: &str, depth: u32) {
        if depth >= MAX_FORM_DEPTH {
            return;
        }
        let Some(xobjects_obj) = resources.get("XObject") else { return };
        let Some(xobjects) = self.parser.resolve(xobjects_obj).as_dict().cloned() else { return };
        let Some(xobj_ref) = xobjects.get(name).cloned() else { return };
        let resolved = self.parser.resolve(&xobj_ref);
        let Some(dict) = resolved.as_dict().cloned() else { return };
        if !matches!(dict.get("Subtype"), Some(Object::Name(n)) if n == "Form") {
            return;
        }
        let Ok(content) = self.parser.resolve_stream(&resolved) else { return };
        let form_matrix = dict.get("Matrix").and_then(Object::as_array).map(matrix_from_array).unwrap_or_else(Matrix::identity);
        let form_resources = dict.get("Resources").map(|r| self.parser.resolve(r)).and_then(|o| o.as_dict().cloned());
        let merged = match &form_resources {
            Some(fr) => merge_resources(resources, fr),
            None => resources.clone(),
        };

        stack.save();
        let parent_ctm = stack.current().ctm;
        stack.current_mut().ctm = form_matrix.multiply(&parent_ctm);
        self.execute(&content, &merged, stack, depth + 1);
        stack.restore();
    }

    fn emit_run(&mut self, gs: &mut GraphicsState, bytes: &[u8]) {
        let Some(font) = gs.current_font.clone() else { return };
        let glyphs = font.decode(bytes);

        let mut text = String::with_capacity(bytes.len());
        let mut total_width = 0.0_f64;
        let mut char_count = 0_f32;
        let mut space_count = 0_f32;
        for glyph in &glyphs {
            text.push_str(&glyph.text);
            total_width += glyph.width / 1000.0;
            char_count += 1.0;
            if glyph.is_space {
                space_count += 1.0;
            }
        }

        if gs.render_mode != 3 || self.options.include_invisible_text {
            let rendering = gs.text_matrix.multiply(&gs.ctm);
            let vertical_scale = if gs.text_matrix.d.abs() > f32::EPSILON { gs.text_matrix.d.abs() } else { gs.text_matrix.a.abs() };
            let horizontal_scale = gs.text_matrix.a.abs();
            self.runs.push(TextRun {
                text,
                x: rendering.e,
                y: rendering.f,
                font_size: gs.font_size * vertical_scale,
                base_font: font.base_font.clone(),
                width: total_width as f32 * gs.font_size * horizontal_scale,
                text_object_id: self.text_object_id,
            });
        }

        let advance = (total_width as f32 * gs.font_size + char_count * gs.char_space + space_count * gs.word_space) * (gs.horizontal_scaling / 100.0);
        gs.text_matrix.e += advance;
    }

    fn load_font(&mut self, resources: &Dict, name: &str) -> Option<Rc<FontInfo>> {
        let fonts_obj = resources.get("Font")?;
        let fonts_dict = self.parser.resolve(fonts_obj).as_dict().cloned()?;
        let font_ref = fonts_dict.get(name)?.clone();
        self.load_font_by_ref(&font_ref)
    }

    fn load_font_by_ref(&mut self, font_ref: &Object) -> Option<Rc<FontInfo>> {
        if let Some(r) = font_ref.as_reference() {
            if let Some(cached) = self.font_cache.get(&r) {
                return Some(cached.clone());
            }
        }
        let font_dict = self.parser.resolve(font_ref).as_dict().cloned()?;
        let info = FontInfo::load(self.parser, &font_dict).ok()?;
        let rc = Rc::new(info);
        if let Some(r) = font_ref.as_reference() {
            self.font_cache.insert(r, rc.clone());
        }
        Some(rc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Primitives;

    #[test]
    fn matrix_from_array_parses_six_numbers() {
        let arr = vec![Object::Number(1.0), Object::Number(0.0), Object::Number(0.0), Object::Number(1.0), Object::Number(5.0), Object::Number(6.0)];
        let m = matrix_from_array(&arr);
        assert_eq!(m.e, 5.0);
        assert_eq!(m.f, 6.0);
    }

    #[test]
    fn matrix_from_array_falls_back_to_identity_on_malformed_input() {
        let m = matrix_from_array(&[Object::Number(1.0)]);
        assert_eq!(m, Matrix::identity());
    }

    #[test]
    fn merge_resources_overlays_child_categories() {
        let mut parent = Dict::new();
        parent.insert("Font".to_string(), Object::Name("ParentFonts".to_string()));
        parent.insert("ColorSpace".to_string(), Object::Name("ParentCS".to_string()));
        let mut child = Dict::new();
        child.insert("Font".to_string(), Object::Name("ChildFonts".to_string()));

        let merged = merge_resources(&parent, &child);
        assert_eq!(merged.get("Font").unwrap().as_name(), Some("ChildFonts"));
        assert_eq!(merged.get("ColorSpace").unwrap().as_name(), Some("ParentCS"));
    }

    /// Builds a minimal single-page PDF with a standard Type1 font and a
    /// short content stream, for integration tests below.
    fn minimal_pdf_with_text(content: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let mut offsets = Vec::new();

        offsets.push(buf.len());
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets.push(buf.len());
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

        offsets.push(buf.len());
        buf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>\nendobj\n");

        offsets.push(buf.len());
        buf.extend_from_slice(b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n");

        offsets.push(buf.len());
        buf.extend_from_slice(format!("5 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes());
        buf.extend_from_slice(content);
        buf.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_off = buf.len();
        let mut xref = String::from("xref\n0 6\n0000000000 65535 f \n");
        for off in &offsets {
            xref.push_str(&format!("{:010} 00000 n \n", off));
        }
        buf.extend_from_slice(xref.as_bytes());
        buf.extend_from_slice(b"trailer\n<< /Size 6 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());
        buf
    }

    #[test]
    fn extracts_a_single_text_run() {
        let pdf = minimal_pdf_with_text(b"BT /F1 12 Tf 100 700 Td (Hi) Tj ET");
        let mut parser = Parser::open(&pdf, Primitives::default(), None).unwrap();
        let pages = parser.pages().unwrap();
        let options = LoadOptions::default();
        let runs = run_page(&mut parser, &pages[0], &options).unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hi");
        assert_eq!(runs[0].x, 100.0);
        assert_eq!(runs[0].y, 700.0);
        assert_eq!(runs[0].base_font, "Helvetica");
        assert_eq!(runs[0].font_size, 12.0);
    }

    #[test]
    fn td_advances_text_line_matrix_across_lines() {
        let pdf = minimal_pdf_with_text(b"BT /F1 10 Tf 0 0 Td 12 TL (A) Tj T* (B) Tj ET");
        let mut parser = Parser::open(&pdf, Primitives::default(), None).unwrap();
        let pages = parser.pages().unwrap();
        let options = LoadOptions::default();
        let runs = run_page(&mut parser, &pages[0], &options).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].y, 0.0);
        assert_eq!(runs[1].y, -12.0, "T* should move down by the current leading (TL)");
    }

    #[test]
    fn invisible_text_is_dropped_unless_opted_in() {
        let pdf = minimal_pdf_with_text(b"BT /F1 12 Tf 3 Tr (Hidden) Tj ET");
        let mut parser = Parser::open(&pdf, Primitives::default(), None).unwrap();
        let pages = parser.pages().unwrap();

        let runs = run_page(&mut parser, &pages[0], &LoadOptions::default()).unwrap();
        assert!(runs.is_empty());

        let mut opts = LoadOptions::default();
        opts.include_invisible_text = true;
        let runs = run_page(&mut parser, &pages[0], &opts).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hidden");
    }
}
