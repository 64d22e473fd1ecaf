//! The assembler (§4.8): a text-object-aware 3-phase sort of positioned
//! text runs, followed by a single walk that decides line/paragraph breaks,
//! word spacing, and span boundaries (bold/italic runs).

use crate::content::TextRun;
use crate::parser_config::LoadOptions;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// DocuSign/IIO-style e-signature anchor tags: a self-closing
    /// `\Name123\`, an open tag with no closing backslash (`\Name123`,
    /// followed by the real value on another run), or a lone orphaned `\`.
    /// Tag bodies may be underscore-segmented (`\IIO_Finance_Contact_Name_1\`).
    static ref FORM_TAG_RE: Regex = Regex::new(r"\\[A-Za-z_]+\d*\\?").unwrap();
    static ref ORPHAN_BACKSLASH_RE: Regex = Regex::new(r"(^|\s)\\(\s|$)").unwrap();
    static ref NON_NEWLINE_WS_RE: Regex = Regex::new(r"[^\S\n]+").unwrap();
    static ref TRAILING_SPACE_BEFORE_NEWLINE_RE: Regex = Regex::new(r"[^\S\n]+\n").unwrap();
    static ref EXCESS_NEWLINES_RE: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// A run of text within a line sharing the same bold/italic state.
#[derive(Debug, Clone)]
pub struct Span {
    /// The span's text, word spacing already resolved.
    pub text: String,
    /// Drawn with a bold-looking `/BaseFont` name.
    pub bold: bool,
    /// Drawn with an italic/oblique-looking `/BaseFont` name.
    pub italic: bool,
    /// URI this span falls inside, set by [`attach_links`].
    pub link: Option<String>,
    /// Device-space x of the span's first contributing run.
    pub x: f32,
}

/// One reading-ordered line assembled from one or more text runs.
#[derive(Debug, Clone)]
pub struct AssembledLine {
    /// The line's full text (spans concatenated), with word spacing
    /// already resolved.
    pub text: String,
    /// The line broken into bold/italic/link-annotated spans.
    pub spans: Vec<Span>,
    /// Font size of the run the line started with (falls back to 12.0 if
    /// the run reported zero, matching the walk's own fallback rule).
    pub font_size: f32,
    /// Device-space y of the line's first run.
    pub y: f32,
    /// True if a paragraph break (blank line) precedes this line.
    pub paragraph_break_before: bool,
    /// True if a paragraph break follows this line (§6's `isBlankAfter`).
    pub is_blank_after: bool,
}

impl AssembledLine {
    /// True if every span on the line is bold (the whole-line-bold rule
    /// §4.10 wraps once rather than per span).
    pub fn is_fully_bold(&self) -> bool {
        !self.spans.is_empty() && self.spans.iter().all(|s| s.bold)
    }

    /// True if every span on the line is italic.
    pub fn is_fully_italic(&self) -> bool {
        !self.spans.is_empty() && self.spans.iter().all(|s| s.italic)
    }
}

/// A `/Rect`-normalised link annotation (§4.11), ready to be matched
/// against assembled spans.
#[derive(Debug, Clone)]
pub struct LinkRect {
    pub uri: String,
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

/// Produce plain text from a page's positioned runs (§4.8).
pub fn assemble_text(items: &[TextRun], options: &LoadOptions) -> String {
    let lines = assemble_lines(items, options);
    let mut out = String::new();
    for line in &lines {
        if line.paragraph_break_before {
            out.push('\n');
        }
        out.push_str(&line.text);
        out.push('\n');
    }
    clean_plain_text(&out, options)
}

/// Produce structured lines (§4.8), the shared traversal the Markdown
/// renderer (§4.10) and plain-text output both build on.
pub fn assemble_lines(items: &[TextRun], options: &LoadOptions) -> Vec<AssembledLine> {
    let sorted = sort_items(items.to_vec());
    walk(&sorted, options)
}

/// Attach link URIs to spans whose start position falls inside a link
/// rect (§4.11).
pub fn attach_links(lines: &mut [AssembledLine], links: &[LinkRect]) {
    for line in lines.iter_mut() {
        for span in line.spans.iter_mut() {
            let hit = links.iter().find(|r| span.x >= r.x_min && span.x <= r.x_max && line.y >= r.y_min && line.y <= r.y_max);
            span.link = hit.map(|r| r.uri.clone());
        }
    }
}

/// 3-phase sort (§4.8 "Sort"): stable `y`-descending, cluster into lines,
/// then within each line group by text-object id (falling back to
/// `x`-ascending for runs that carry none).
fn sort_items(mut items: Vec<TextRun>) -> Vec<TextRun> {
    items.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal));

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    for item in items {
        let starts_new_line = match lines.last().and_then(|l| l.last()) {
            Some(prev) => {
                let font_size = if prev.font_size > 0.0 { prev.font_size } else { 12.0 };
                (item.y - prev.y).abs() > 0.5 * font_size
            },
            None => true,
        };
        if starts_new_line {
            lines.push(vec![item]);
        } else {
            lines.last_mut().unwrap().push(item);
        }
    }

    lines.into_iter().flat_map(order_line).collect()
}

/// An id of `0` means "no `BT`/`ET` text object seen" (the interpreter's
/// counter starts at 0 and only increments on `BT`), so those runs never
/// group together — each falls back to being ordered purely by `x`.
fn order_line(line: Vec<TextRun>) -> Vec<TextRun> {
    struct Group {
        id: Option<u32>,
        items: Vec<TextRun>,
    }

    let mut groups: Vec<Group> = Vec::new();
    for item in line {
        let key = if item.text_object_id == 0 { None } else { Some(item.text_object_id) };
        let existing = key.and_then(|k| groups.iter_mut().find(|g| g.id == Some(k)));
        match existing {
            Some(group) => group.items.push(item),
            None => groups.push(Group { id: key, items: vec![item] }),
        }
    }

    groups.sort_by(|a, b| {
        let ax = a.items.iter().map(|i| i.x).fold(f32::INFINITY, f32::min);
        let bx = b.items.iter().map(|i| i.x).fold(f32::INFINITY, f32::min);
        ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
    });
    groups.into_iter().flat_map(|g| g.items).collect()
}

struct WalkState {
    last_x: f32,
    last_y: f32,
    last_font_size: f32,
    last_width: f32,
    last_text_len: usize,
    last_has_metric_width: bool,
}

/// The walk (§4.8): one pass over the sorted runs deciding line/paragraph
/// breaks, within-line word spacing, and span boundaries.
fn walk(items: &[TextRun], options: &LoadOptions) -> Vec<AssembledLine> {
    let mut out: Vec<AssembledLine> = Vec::new();
    let mut iter = items.iter();
    let Some(first) = iter.next() else { return out };

    let mut current_y = first.y;
    let mut current_font_size = if first.font_size > 0.0 { first.font_size } else { 12.0 };
    let mut current_spans: Vec<Span> = vec![new_span(first)];
    let mut paragraph_pending = false;

    let mut state = WalkState {
        last_x: first.x,
        last_y: first.y,
        last_font_size: first.font_size,
        last_width: first.width,
        last_text_len: first.text.chars().count(),
        last_has_metric_width: first.width > 0.0,
    };

    for item in iter {
        let effective_last_font_size = if state.last_font_size > 0.0 { state.last_font_size } else { 12.0 };
        let dy = (item.y - state.last_y).abs();

        if dy > 0.5 * effective_last_font_size {
            out.push(finish_line(current_spans, current_font_size, current_y, paragraph_pending));
            paragraph_pending = dy > 1.8 * effective_last_font_size;
            current_y = item.y;
            current_font_size = if item.font_size > 0.0 { item.font_size } else { 12.0 };
            current_spans = vec![new_span(item)];
        } else {
            let x_gap = item.x - (state.last_x + state.last_width);
            let pos_gap = item.x - state.last_x;
            let insert_space = x_gap < -2.0 * effective_last_font_size
                || should_insert_space(x_gap, pos_gap, state.last_text_len, effective_last_font_size, state.last_has_metric_width);
            append_to_line(&mut current_spans, item, insert_space);
        }

        state = WalkState {
            last_x: item.x,
            last_y: item.y,
            last_font_size: item.font_size,
            last_width: item.width,
            last_text_len: item.text.chars().count(),
            last_has_metric_width: item.width > 0.0,
        };
    }
    out.push(finish_line(current_spans, current_font_size, current_y, paragraph_pending));

    // The last line's own paragraph_break_before never gets a look-ahead
    // neighbour, so fill `is_blank_after` now that every line exists.
    for i in 0..out.len().saturating_sub(1) {
        out[i].is_blank_after = out[i + 1].paragraph_break_before;
    }

    if options.strip_form_placeholders {
        for line in &mut out {
            strip_form_placeholders_from_line(line);
        }
    }
    out
}

fn new_span(item: &TextRun) -> Span {
    Span { text: item.text.clone(), bold: is_bold_font(&item.base_font), italic: is_italic_font(&item.base_font), link: None, x: item.x }
}

fn append_to_line(spans: &mut Vec<Span>, item: &TextRun, insert_space: bool) {
    let bold = is_bold_font(&item.base_font);
    let italic = is_italic_font(&item.base_font);
    match spans.last_mut() {
        Some(last) if last.bold == bold && last.italic == italic => {
            if insert_space {
                last.text.push(' ');
            }
            last.text.push_str(&item.text);
        },
        _ => {
            let mut text = item.text.clone();
            if insert_space {
                text = format!(" {text}");
            }
            spans.push(Span { text, bold, italic, link: None, x: item.x });
        },
    }
}

fn finish_line(spans: Vec<Span>, font_size: f32, y: f32, paragraph_break_before: bool) -> AssembledLine {
    let text = spans.iter().map(|s| s.text.as_str()).collect::<String>();
    AssembledLine { text, spans, font_size, y, paragraph_break_before, is_blank_after: false }
}

/// §4.8 "should_insert_space": when the previous run had a real metric
/// width, a gap is a space once it exceeds 15% of an em; otherwise fall
/// back to estimating the prior run's width from its character count.
fn should_insert_space(x_gap: f32, pos_gap: f32, last_text_len: usize, last_font_size: f32, last_has_metric_width: bool) -> bool {
    if last_has_metric_width {
        x_gap > 0.15 * last_font_size
    } else {
        let estimate = (last_text_len.max(1) as f32) * last_font_size * 0.5;
        pos_gap > estimate
    }
}

fn is_bold_font(base_font: &str) -> bool {
    base_font.to_ascii_lowercase().contains("bold")
}

fn is_italic_font(base_font: &str) -> bool {
    let lower = base_font.to_ascii_lowercase();
    lower.contains("italic") || lower.contains("oblique")
}

fn strip_form_placeholders_from_line(line: &mut AssembledLine) {
    for span in line.spans.iter_mut() {
        span.text = strip_form_placeholders(&span.text);
    }
    line.text = strip_form_placeholders(&line.text);
}

fn strip_form_placeholders(text: &str) -> String {
    let stripped = FORM_TAG_RE.replace_all(text, "");
    ORPHAN_BACKSLASH_RE.replace_all(&stripped, "$1$2").into_owned()
}

/// §4.8 "Output cleaning (plain text)": collapse non-newline whitespace,
/// strip trailing spaces before newlines, cap blank lines at one, trim.
fn clean_plain_text(text: &str, _options: &LoadOptions) -> String {
    let collapsed = NON_NEWLINE_WS_RE.replace_all(text, " ");
    let trimmed_lines = TRAILING_SPACE_BEFORE_NEWLINE_RE.replace_all(&collapsed, "\n");
    let capped = EXCESS_NEWLINES_RE.replace_all(&trimmed_lines, "\n\n");
    capped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, y: f32, font_size: f32, width: f32, text_object_id: u32) -> TextRun {
        TextRun { text: text.to_string(), x, y, font_size, base_font: "Helvetica".to_string(), width, text_object_id }
    }

    fn run_font(text: &str, x: f32, y: f32, font_size: f32, width: f32, text_object_id: u32, base_font: &str) -> TextRun {
        TextRun { text: text.to_string(), x, y, font_size, base_font: base_font.to_string(), width, text_object_id }
    }

    #[test]
    fn joins_same_line_runs_with_a_space() {
        let items = vec![run("Hello", 0.0, 700.0, 12.0, 30.0, 1), run("World", 40.0, 700.0, 12.0, 30.0, 1)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "Hello World");
    }

    #[test]
    fn does_not_insert_space_for_tight_kerning() {
        let items = vec![run("Wo", 0.0, 700.0, 12.0, 14.0, 1), run("rld", 14.0, 700.0, 12.0, 18.0, 1)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "World");
    }

    #[test]
    fn large_y_jump_starts_a_paragraph() {
        let items = vec![run("First", 0.0, 700.0, 12.0, 30.0, 1), run("Second", 0.0, 600.0, 12.0, 30.0, 2)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "First\n\nSecond");
    }

    #[test]
    fn small_y_jump_is_just_a_line_break() {
        let items = vec![run("First", 0.0, 700.0, 12.0, 30.0, 1), run("Second", 0.0, 695.0, 12.0, 30.0, 2)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "First\nSecond");
    }

    #[test]
    fn text_object_groups_keep_overlay_runs_from_interleaving() {
        // Two BT/ET objects target the same baseline; group 2 (leftmost)
        // must come out before group 1 even though its runs were emitted
        // second in stream order within this synthetic input.
        let items = vec![run("AAA", 50.0, 700.0, 12.0, 30.0, 1), run("BBB", 0.0, 700.0, 12.0, 30.0, 2)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "BBB AAA");
    }

    #[test]
    fn strips_docusign_style_self_closing_tag() {
        let items = vec![run("Signed by \\SIG1\\ on file", 0.0, 700.0, 12.0, 150.0, 1)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "Signed by on file");
    }

    #[test]
    fn strips_underscore_segmented_placeholder_tag() {
        let items = vec![run("Contact: \\IIO_Finance_Contact_Name_1\\ approved", 0.0, 700.0, 12.0, 300.0, 1)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "Contact: approved");
    }

    #[test]
    fn leaves_placeholder_when_stripping_disabled() {
        let items = vec![run("\\SIG1\\", 0.0, 700.0, 12.0, 30.0, 1)];
        let mut options = LoadOptions::default();
        options.strip_form_placeholders = false;
        let text = assemble_text(&items, &options);
        assert_eq!(text, "\\SIG1\\");
    }

    #[test]
    fn caps_blank_lines_at_one() {
        let items = vec![run("A", 0.0, 900.0, 12.0, 10.0, 1), run("B", 0.0, 500.0, 12.0, 10.0, 2)];
        let text = assemble_text(&items, &LoadOptions::default());
        assert_eq!(text, "A\n\nB");
    }

    #[test]
    fn bold_run_becomes_its_own_span() {
        let items = vec![
            run_font("Plain ", 0.0, 700.0, 12.0, 36.0, 1, "Helvetica"),
            run_font("Bold", 40.0, 700.0, 12.0, 24.0, 1, "Helvetica-Bold"),
        ];
        let lines = assemble_lines(&items, &LoadOptions::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans.len(), 2);
        assert!(!lines[0].spans[0].bold);
        assert!(lines[0].spans[1].bold);
        assert!(!lines[0].is_fully_bold());
    }

    #[test]
    fn fully_bold_line_reports_is_fully_bold() {
        let items = vec![run_font("Title", 0.0, 700.0, 14.0, 40.0, 1, "Arial-BoldMT")];
        let lines = assemble_lines(&items, &LoadOptions::default());
        assert!(lines[0].is_fully_bold());
    }

    #[test]
    fn attaches_link_to_span_inside_rect() {
        let items = vec![run("Visit site", 10.0, 700.0, 12.0, 60.0, 1)];
        let mut lines = assemble_lines(&items, &LoadOptions::default());
        let links = vec![LinkRect { uri: "https://example.com".to_string(), x_min: 0.0, y_min: 695.0, x_max: 100.0, y_max: 705.0 }];
        attach_links(&mut lines, &links);
        assert_eq!(lines[0].spans[0].link.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn marks_blank_line_following_a_paragraph_break() {
        let items = vec![run("First", 0.0, 700.0, 12.0, 30.0, 1), run("Second", 0.0, 600.0, 12.0, 30.0, 2)];
        let lines = assemble_lines(&items, &LoadOptions::default());
        assert!(lines[0].is_blank_after);
        assert!(lines[1].paragraph_break_before);
    }
}
