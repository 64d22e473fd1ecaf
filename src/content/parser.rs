//! Content-stream tokenizer (§4.5): turns decoded content-stream bytes into
//! a flat sequence of [`Operator`]s, in postfix form (operands precede their
//! operator). Reuses the same [`Lexer`] and COS value grammar as the main
//! object parser; a content stream's operands are ordinary COS values.

use crate::content::operators::{build_operator, Operator};
use crate::lexer::{Lexer, Token};
use crate::object::Object;
use crate::xref;

/// Parse a decoded content stream into its operator sequence. Never fails:
/// an operand that doesn't parse as a COS value is skipped one byte at a
/// time so a single malformed run doesn't abort the whole stream.
pub fn parse_content_stream(data: &[u8]) -> Vec<Operator> {
    let mut lexer = Lexer::new(data);
    let mut operators = Vec::new();
    let mut operands: Vec<Object> = Vec::new();

    loop {
        let save = lexer.position();
        match lexer.next_token() {
            Token::Eof => break,
            Token::Keyword("BI") => {
                skip_inline_image(&mut lexer);
                operands.clear();
            },
            Token::Keyword(name) => {
                operators.push(build_operator(name, std::mem::take(&mut operands)));
            },
            _ => {
                lexer.set_position(save);
                match xref::parse_dict_value(&mut lexer) {
                    Ok(obj) => operands.push(obj),
                    Err(_) => lexer.set_position(save + 1),
                }
            },
        }
    }

    operators
}

fn is_ws(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Skip a `BI ... ID ... EI` inline-image sequence (§4.5). Inline images are
/// out of scope: we only need to find where the content stream resumes.
fn skip_inline_image(lexer: &mut Lexer<'_>) {
    loop {
        match lexer.next_token() {
            Token::Keyword("ID") => break,
            Token::Eof => return,
            _ => {},
        }
    }

    let buf = lexer.buffer();
    let mut pos = lexer.position();
    if buf.get(pos).copied().map(is_ws).unwrap_or(false) {
        pos += 1;
    }

    let mut search_from = pos;
    loop {
        match lexer.find_next(b"EI", search_from) {
            Some(idx) => {
                let before_ok = idx == 0 || buf.get(idx - 1).copied().map(is_ws).unwrap_or(true);
                let after_ok = buf.get(idx + 2).copied().map(is_ws).unwrap_or(true);
                if before_ok && after_ok {
                    lexer.set_position(idx + 2);
                    return;
                }
                search_from = idx + 1;
            },
            None => {
                lexer.set_position(buf.len());
                return;
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::operators::TextElement;

    #[test]
    fn parses_text_showing_sequence() {
        let ops = parse_content_stream(b"BT /F1 12 Tf 100 700 Td (Hello) Tj ET");
        assert_eq!(
            ops,
            vec![
                Operator::BeginText,
                Operator::SetFont { name: "F1".to_string(), size: 12.0 },
                Operator::MoveText { tx: 100.0, ty: 700.0 },
                Operator::ShowText(b"Hello".to_vec()),
                Operator::EndText,
            ]
        );
    }

    #[test]
    fn parses_tj_array_with_adjustments() {
        let ops = parse_content_stream(b"[(Hi) -250 (!)] TJ");
        match &ops[0] {
            Operator::ShowTextArray(elements) => {
                assert_eq!(elements[0], TextElement::Text(b"Hi".to_vec()));
                assert_eq!(elements[1], TextElement::Adjustment(-250.0));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn skips_inline_image_and_resumes() {
        let data = b"BI /W 1 /H 1 /BPC 8 /CS /G ID \x01 EI q Q";
        let ops = parse_content_stream(data);
        assert_eq!(ops, vec![Operator::SaveState, Operator::RestoreState]);
    }

    #[test]
    fn unrecognized_garbage_does_not_loop_forever() {
        let ops = parse_content_stream(b"\x01\x02\x03 q");
        assert_eq!(ops, vec![Operator::SaveState]);
    }

    #[test]
    fn path_construction_falls_back_to_other() {
        let ops = parse_content_stream(b"0 0 100 50 re f");
        assert!(matches!(&ops[0], Operator::Other { name, .. } if name == "re"));
        assert!(matches!(&ops[1], Operator::Other { name, .. } if name == "f"));
    }
}
