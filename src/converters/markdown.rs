//! Markdown rendering (§4.10): turns a page's [`AssembledLine`]s and
//! detected [`Table`]s into a GFM-compatible string.

use crate::layout::Table;
use crate::text::{AssembledLine, Span};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref RE_URL: Regex = Regex::new(r"(https?://[^\s<>\[\]]*[^\s<>\[\].,!?;:])").unwrap();
    static ref RE_BULLET_GLYPH: Regex = Regex::new(r"^[•‣◦⁃∙\-\*]\s+").unwrap();
    static ref RE_LIST_PREFIX: Regex = Regex::new(r"^([0-9]+|[a-zA-Z])[.)]\s+").unwrap();
}

/// Render a page's assembled lines to Markdown, substituting detected
/// tables for the line-by-line text inside their y-range (§4.9).
pub fn render_markdown(lines: &[AssembledLine], tables: &[Table]) -> String {
    let body_size = compute_body_font_size(lines);
    let mut out = String::new();

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        if let Some(table) = tables.iter().find(|t| line.y <= t.y_start && line.y >= t.y_end) {
            out.push_str(&render_table(table));
            out.push('\n');
            while i < lines.len() && lines[i].y <= table.y_start && lines[i].y >= table.y_end {
                i += 1;
            }
            continue;
        }

        render_line(&mut out, line, body_size);
        i += 1;
    }

    out
}

fn render_line(out: &mut String, line: &AssembledLine, body_size: f32) {
    let trimmed = line.text.trim_end();
    let is_heading_candidate = line.text.chars().count() <= 200 && !trimmed.ends_with(',') && !trimmed.ends_with(';');
    let factor = if body_size > 0.0 { line.font_size / body_size } else { 1.0 };
    let heading_level = if is_heading_candidate { heading_level_for_factor(factor) } else { None };

    if let Some(level) = heading_level {
        out.push_str(&"#".repeat(level));
        out.push(' ');
        out.push_str(&autolink(&line.text));
        out.push_str("\n\n");
        return;
    }

    if let Some((marker, rest)) = list_prefix(&line.text) {
        out.push_str(&marker);
        out.push_str(&autolink(&rest));
    } else {
        out.push_str(&render_spans(line));
    }
    out.push('\n');
    if line.is_blank_after {
        out.push('\n');
    }
}

fn heading_level_for_factor(factor: f32) -> Option<usize> {
    if factor >= 2.0 {
        Some(1)
    } else if factor >= 1.6 {
        Some(2)
    } else if factor >= 1.3 {
        Some(3)
    } else if factor >= 1.15 {
        Some(4)
    } else {
        None
    }
}

/// Span rendering: a line where every span is bold/italic wraps once;
/// otherwise each span is wrapped independently (§4.10).
fn render_spans(line: &AssembledLine) -> String {
    if line.is_fully_bold() && line.is_fully_italic() {
        return format!("***{}***", line.spans.iter().map(render_span_content).collect::<String>());
    }
    if line.is_fully_bold() {
        return format!("**{}**", line.spans.iter().map(render_span_content).collect::<String>());
    }
    if line.is_fully_italic() {
        return format!("*{}*", line.spans.iter().map(render_span_content).collect::<String>());
    }
    line.spans.iter().map(render_span).collect()
}

fn render_span(span: &Span) -> String {
    let content = render_span_content(span);
    match (span.bold, span.italic) {
        (true, true) => format!("***{content}***"),
        (true, false) => format!("**{content}**"),
        (false, true) => format!("*{content}*"),
        (false, false) => content,
    }
}

fn render_span_content(span: &Span) -> String {
    match &span.link {
        Some(uri) => format!("[{}]({uri})", span.text),
        None => autolink(&span.text),
    }
}

fn autolink(text: &str) -> String {
    RE_URL.replace_all(text, |caps: &Captures| format!("[{0}]({0})", &caps[1])).into_owned()
}

/// List normalisation (§4.10): bullet glyphs become `- `, numeric/alpha
/// prefixes keep their token but get a normalised `. ` separator.
fn list_prefix(text: &str) -> Option<(String, String)> {
    if let Some(m) = RE_BULLET_GLYPH.find(text) {
        return Some(("- ".to_string(), text[m.end()..].to_string()));
    }
    if let Some(caps) = RE_LIST_PREFIX.captures(text) {
        let token = caps.get(1).unwrap().as_str().to_string();
        let rest = text[caps.get(0).unwrap().end()..].to_string();
        return Some((format!("{token}. "), rest));
    }
    None
}

/// Body font size (§4.10): the size with the greatest total character
/// weight across all lines.
fn compute_body_font_size(lines: &[AssembledLine]) -> f32 {
    let mut buckets: Vec<(i32, f32, usize)> = Vec::new();
    for line in lines {
        let key = (line.font_size * 10.0).round() as i32;
        let weight = line.text.chars().count();
        match buckets.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => entry.2 += weight,
            None => buckets.push((key, line.font_size, weight)),
        }
    }
    buckets.into_iter().max_by_key(|(_, _, w)| *w).map(|(_, size, _)| size).unwrap_or(12.0)
}

fn render_table(table: &Table) -> String {
    if table.rows.is_empty() {
        return String::new();
    }
    let col_count = table.rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let header_idx = table.header_row.unwrap_or(0);

    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&pad_row(&table.rows[header_idx], col_count).join(" | "));
    out.push_str(" |\n|");
    for _ in 0..col_count {
        out.push_str(" --- |");
    }
    out.push('\n');
    for (i, row) in table.rows.iter().enumerate() {
        if i == header_idx {
            continue;
        }
        out.push_str("| ");
        out.push_str(&pad_row(row, col_count).join(" | "));
        out.push_str(" |\n");
    }
    out
}

fn pad_row(row: &[String], col_count: usize) -> Vec<String> {
    let mut padded = row.to_vec();
    padded.resize(col_count, String::new());
    padded
}
