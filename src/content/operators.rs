//! Content-stream operators (§4.5): the subset the interpreter acts on,
//! plus a catch-all for everything else (path construction, color, clipping)
//! whose operands are parsed and discarded rather than carried around.

use crate::object::Object;

/// A content-stream operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// `BT`
    BeginText,
    /// `ET`
    EndText,
    /// `Tc`
    SetCharSpace(f32),
    /// `Tw`
    SetWordSpace(f32),
    /// `Tz`
    SetHorizontalScaling(f32),
    /// `TL`
    SetLeading(f32),
    /// `Tf name size`
    SetFont {
        /// Font resource name.
        name: String,
        /// Font size.
        size: f32,
    },
    /// `Ts`
    SetTextRise(f32),
    /// `Tr`
    SetRenderMode(u8),
    /// `Td tx ty`
    MoveText {
        /// Horizontal offset.
        tx: f32,
        /// Vertical offset.
        ty: f32,
    },
    /// `TD tx ty`
    MoveTextSetLeading {
        /// Horizontal offset.
        tx: f32,
        /// Vertical offset.
        ty: f32,
    },
    /// `Tm a b c d e f`
    SetTextMatrix {
        /// Matrix element a.
        a: f32,
        /// Matrix element b.
        b: f32,
        /// Matrix element c.
        c: f32,
        /// Matrix element d.
        d: f32,
        /// Matrix element e.
        e: f32,
        /// Matrix element f.
        f: f32,
    },
    /// `T*`
    NextLine,
    /// `Tj s`
    ShowText(Vec<u8>),
    /// `TJ arr`
    ShowTextArray(Vec<TextElement>),
    /// `' s`
    NextLineShowText(Vec<u8>),
    /// `" aw ac s`
    SetSpacingShowText {
        /// Word spacing.
        word_space: f32,
        /// Character spacing.
        char_space: f32,
        /// Text to show.
        text: Vec<u8>,
    },
    /// `q`
    SaveState,
    /// `Q`
    RestoreState,
    /// `cm a b c d e f`
    ConcatMatrix {
        /// Matrix element a.
        a: f32,
        /// Matrix element b.
        b: f32,
        /// Matrix element c.
        c: f32,
        /// Matrix element d.
        d: f32,
        /// Matrix element e.
        e: f32,
        /// Matrix element f.
        f: f32,
    },
    /// `name Do`
    PaintXObject(String),
    /// `name gs`
    SetExtGState(String),
    /// Any operator not listed above; operands are kept but otherwise
    /// unused (path construction, color, clipping, marked content, ...).
    Other {
        /// Operator keyword.
        name: String,
        /// Raw operands.
        operands: Vec<Object>,
    },
}

/// An element of a `TJ` array: either a string to show, or a positioning
/// adjustment in thousandths of text space.
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    /// Text to show.
    Text(Vec<u8>),
    /// Positioning adjustment.
    Adjustment(f32),
}

fn num(operands: &[Object], i: usize) -> f32 {
    operands.get(i).and_then(Object::as_f64).unwrap_or(0.0) as f32
}

fn string(operands: &[Object], i: usize) -> Vec<u8> {
    operands.get(i).and_then(Object::as_string_bytes).map(|b| b.to_vec()).unwrap_or_default()
}

fn name(operands: &[Object], i: usize) -> String {
    operands.get(i).and_then(Object::as_name).unwrap_or("").to_string()
}

/// Build a typed [`Operator`] from a raw keyword and its preceding operands.
pub(super) fn build_operator(keyword: &str, operands: Vec<Object>) -> Operator {
    match keyword {
        "BT" => Operator::BeginText,
        "ET" => Operator::EndText,
        "Tc" => Operator::SetCharSpace(num(&operands, 0)),
        "Tw" => Operator::SetWordSpace(num(&operands, 0)),
        "Tz" => Operator::SetHorizontalScaling(num(&operands, 0)),
        "TL" => Operator::SetLeading(num(&operands, 0)),
        "Tf" => Operator::SetFont { name: name(&operands, 0), size: num(&operands, 1) },
        "Ts" => Operator::SetTextRise(num(&operands, 0)),
        "Tr" => Operator::SetRenderMode(operands.first().and_then(Object::as_int).unwrap_or(0) as u8),
        "Td" => Operator::MoveText { tx: num(&operands, 0), ty: num(&operands, 1) },
        "TD" => Operator::MoveTextSetLeading { tx: num(&operands, 0), ty: num(&operands, 1) },
        "Tm" => Operator::SetTextMatrix { a: num(&operands, 0), b: num(&operands, 1), c: num(&operands, 2), d: num(&operands, 3), e: num(&operands, 4), f: num(&operands, 5) },
        "T*" => Operator::NextLine,
        "Tj" => Operator::ShowText(string(&operands, 0)),
        "TJ" => {
            let elements = operands
                .first()
                .and_then(Object::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|obj| match obj {
                            Object::String(s) => Some(TextElement::Text(s.clone())),
                            Object::Number(n) => Some(TextElement::Adjustment(*n as f32)),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            Operator::ShowTextArray(elements)
        },
        "'" => Operator::NextLineShowText(string(&operands, 0)),
        "\"" => Operator::SetSpacingShowText { word_space: num(&operands, 0), char_space: num(&operands, 1), text: string(&operands, 2) },
        "q" => Operator::SaveState,
        "Q" => Operator::RestoreState,
        "cm" => Operator::ConcatMatrix { a: num(&operands, 0), b: num(&operands, 1), c: num(&operands, 2), d: num(&operands, 3), e: num(&operands, 4), f: num(&operands, 5) },
        "Do" => Operator::PaintXObject(name(&operands, 0)),
        "gs" => Operator::SetExtGState(name(&operands, 0)),
        other => Operator::Other { name: other.to_string(), operands },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_text_positioning_operators() {
        assert_eq!(build_operator("Td", vec![Object::Number(10.0), Object::Number(20.0)]), Operator::MoveText { tx: 10.0, ty: 20.0 });
        assert_eq!(
            build_operator("Tm", vec![Object::Number(1.0), Object::Number(0.0), Object::Number(0.0), Object::Number(1.0), Object::Number(5.0), Object::Number(6.0)]),
            Operator::SetTextMatrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 5.0, f: 6.0 }
        );
    }

    #[test]
    fn builds_show_text_array_with_adjustments() {
        let array = Object::Array(vec![Object::String(b"Hi".to_vec()), Object::Number(-250.0), Object::String(b"!".to_vec())]);
        let op = build_operator("TJ", vec![array]);
        match op {
            Operator::ShowTextArray(elements) => {
                assert_eq!(elements[0], TextElement::Text(b"Hi".to_vec()));
                assert_eq!(elements[1], TextElement::Adjustment(-250.0));
                assert_eq!(elements[2], TextElement::Text(b"!".to_vec()));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn builds_font_and_xobject_operators() {
        assert_eq!(build_operator("Tf", vec![Object::Name("F1".into()), Object::Number(12.0)]), Operator::SetFont { name: "F1".to_string(), size: 12.0 });
        assert_eq!(build_operator("Do", vec![Object::Name("Im1".into())]), Operator::PaintXObject("Im1".to_string()));
        assert_eq!(build_operator("gs", vec![Object::Name("GS1".into())]), Operator::SetExtGState("GS1".to_string()));
    }

    #[test]
    fn unknown_operator_falls_back_to_other() {
        let op = build_operator("re", vec![Object::Number(0.0), Object::Number(0.0), Object::Number(100.0), Object::Number(50.0)]);
        match op {
            Operator::Other { name, operands } => {
                assert_eq!(name, "re");
                assert_eq!(operands.len(), 4);
            },
            other => panic!("unexpected {:?}", other),
        }
    }
}
