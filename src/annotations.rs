//! Link annotations (§4.11): walks a page's `/Annots`, keeping only
//! `/Subtype /Link` entries whose action is a URI action, and normalises
//! each into a rect the assembler can match spans against.

use crate::object::{Dict, Object};
use crate::parser::Parser;
use crate::text::LinkRect;

/// A `/Subtype /Link` annotation with a `/A /S /URI` action.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Decoded `/URI` target.
    pub uri: String,
    /// `[x1, y1, x2, y2]`, not yet normalised to min/max.
    pub rect: [f64; 4],
}

/// Walk `page["Annots"]`, keeping link annotations with a `/URI` action.
pub fn collect_link_annotations(parser: &mut Parser<'_>, page: &Dict) -> Vec<Annotation> {
    let Some(annots) = page.get("Annots") else { return Vec::new() };
    let resolved = parser.resolve(annots);
    let Some(array) = resolved.as_array() else { return Vec::new() };

    let mut out = Vec::new();
    for entry in array {
        let resolved_entry = parser.resolve(entry);
        let Some(dict) = resolved_entry.as_dict() else { continue };
        if dict.get("Subtype").and_then(Object::as_name) != Some("Link") {
            continue;
        }
        let Some(action) = dict.get("A") else { continue };
        let resolved_action = parser.resolve(action);
        let Some(action_dict) = resolved_action.as_dict() else { continue };
        if action_dict.get("S").and_then(Object::as_name) != Some("URI") {
            continue;
        }
        let Some(uri) = action_dict.get("URI").and_then(Object::as_string_bytes).map(decode_latin1) else { continue };
        let Some(rect) = dict.get("Rect").and_then(Object::as_array).and_then(parse_rect) else { continue };

        out.push(Annotation { uri, rect });
    }
    out
}

/// Build [`LinkRect`]s (normalised to min/max) for the assembler.
pub fn link_rects(annotations: &[Annotation]) -> Vec<LinkRect> {
    annotations
        .iter()
        .map(|a| {
            let [x1, y1, x2, y2] = a.rect;
            LinkRect {
                uri: a.uri.clone(),
                x_min: x1.min(x2) as f32,
                y_min: y1.min(y2) as f32,
                x_max: x1.max(x2) as f32,
                y_max: y1.max(y2) as f32,
            }
        })
        .collect()
}

fn parse_rect(arr: &[Object]) -> Option<[f64; 4]> {
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (i, v) in arr.iter().enumerate() {
        out[i] = v.as_f64()?;
    }
    Some(out)
}

/// `/URI` strings are plain bytes; §4.11 reads them as Latin-1.
fn decode_latin1(bytes: Vec<u8>) -> String {
    bytes.into_iter().map(|b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rect_normalises_swapped_corners() {
        let annotations = vec![Annotation { uri: "https://example.com".to_string(), rect: [100.0, 50.0, 0.0, 10.0] }];
        let rects = link_rects(&annotations);
        assert_eq!(rects[0].x_min, 0.0);
        assert_eq!(rects[0].x_max, 100.0);
        assert_eq!(rects[0].y_min, 10.0);
        assert_eq!(rects[0].y_max, 50.0);
    }

    #[test]
    fn parse_rect_rejects_wrong_length() {
        let arr = vec![Object::Number(0.0), Object::Number(0.0)];
        assert!(parse_rect(&arr).is_none());
    }

    #[test]
    fn decode_latin1_preserves_high_bytes() {
        assert_eq!(decode_latin1(vec![0x41, 0xE9]), "A\u{e9}");
    }
}
