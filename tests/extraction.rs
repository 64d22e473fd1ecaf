//! End-to-end extraction scenarios (§8): each builds a minimal PDF byte
//! buffer by hand (no external fixture files) and drives it through the
//! public [`PdfDocument`] API.

use pdfcrumb::PdfDocument;
use proptest::prelude::*;

/// Assembles a minimal PDF: one Helvetica font, one `/Pages` tree with a
/// page per `contents` entry, and an explicit xref table. `info` fills in
/// `/Title`, `/Author`, `/Producer` on an `/Info` dict when present.
fn build_pdf(contents: &[&[u8]], info: Option<(&str, &str, &str)>) -> Vec<u8> {
    let n = contents.len();
    let total_objects = 3 + n + n + if info.is_some() { 1 } else { 0 };
    let mut offsets = vec![0usize; total_objects + 1];
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n");

    offsets[1] = buf.len();
    buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    offsets[2] = buf.len();
    let kids: String = (0..n).map(|i| format!("{} 0 R ", 4 + i)).collect();
    buf.extend_from_slice(format!("2 0 obj\n<< /Type /Pages /Kids [{}] /Count {n} >>\nendobj\n", kids.trim()).as_bytes());

    offsets[3] = buf.len();
    buf.extend_from_slice(b"3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n");

    for (i, content) in contents.iter().enumerate() {
        let page_obj = 4 + i;
        let content_obj = 4 + n + i;
        offsets[page_obj] = buf.len();
        buf.extend_from_slice(
            format!(
                "{page_obj} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {content_obj} 0 R >>\nendobj\n"
            )
            .as_bytes(),
        );
    }
    for (i, content) in contents.iter().enumerate() {
        let content_obj = 4 + n + i;
        offsets[content_obj] = buf.len();
        buf.extend_from_slice(format!("{content_obj} 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes());
        buf.extend_from_slice(content);
        buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    let info_obj = info.map(|_| 4 + 2 * n);
    if let (Some((title, author, producer)), Some(obj)) = (info, info_obj) {
        offsets[obj] = buf.len();
        buf.extend_from_slice(format!("{obj} 0 obj\n<< /Title ({title}) /Author ({author}) /Producer ({producer}) >>\nendobj\n").as_bytes());
    }

    let xref_off = buf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", total_objects + 1);
    for obj in &offsets[1..] {
        xref.push_str(&format!("{obj:010} 00000 n \n"));
    }
    buf.extend_from_slice(xref.as_bytes());
    let mut trailer = format!("trailer\n<< /Size {} /Root 1 0 R", total_objects + 1);
    if let Some(obj) = info_obj {
        trailer.push_str(&format!(" /Info {obj} 0 R"));
    }
    trailer.push_str(" >>\n");
    buf.extend_from_slice(trailer.as_bytes());
    buf.extend_from_slice(format!("startxref\n{xref_off}\n%%EOF").as_bytes());
    buf
}

/// Collapses runs of whitespace to a single space, so a "words separated by
/// whitespace" assertion doesn't care whether the gap came out as one space,
/// several, or a newline.
fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn simple_single_page_document_extracts_its_text() {
    let pdf = build_pdf(&[b"BT /F1 12 Tf 72 700 Td (Hello World) Tj ET"], None);
    let doc = PdfDocument::open_bytes(pdf).unwrap();

    assert_eq!(doc.page_count(), 1);
    assert!(doc.text().unwrap().contains("Hello World"));
}

#[test]
fn multipage_document_preserves_page_order() {
    let pdf = build_pdf(
        &[b"BT /F1 12 Tf 72 700 Td (Page One) Tj ET", b"BT /F1 12 Tf 72 700 Td (Page Two) Tj ET"],
        None,
    );
    let doc = PdfDocument::open_bytes(pdf).unwrap();

    assert_eq!(doc.page_count(), 2);
    assert!(doc.page_text(0).unwrap().contains("Page One"));
    assert!(doc.page_text(1).unwrap().contains("Page Two"));

    let whole = doc.text().unwrap();
    let first = whole.find("Page One").expect("page one present");
    let second = whole.find("Page Two").expect("page two present");
    assert!(first < second, "page order must survive into the joined document text");
}

#[test]
fn metadata_decodes_plain_literal_info_strings() {
    let pdf = build_pdf(&[b"BT /F1 12 Tf 72 700 Td (Body text) Tj ET"], Some(("Quarterly Report", "Jane Doe", "pdfcrumb test fixture")));
    let doc = PdfDocument::open_bytes(pdf).unwrap();

    let meta = doc.metadata().unwrap();
    assert_eq!(meta.title.as_deref(), Some("Quarterly Report"));
    assert_eq!(meta.author.as_deref(), Some("Jane Doe"));
    assert_eq!(meta.producer.as_deref(), Some("pdfcrumb test fixture"));
    assert_eq!(meta.page_count, 1);
}

#[test]
fn tj_array_reproduces_word_gaps_and_swallows_kerning() {
    // "Amount" / "due" are split by a TJ adjustment large enough to read as
    // a real word gap; "Nov" / "ember" are split by a small positive
    // (tightening) adjustment that must NOT read as a gap.
    let content = b"BT /F1 12 Tf 72 700 Td [(Amount) -300 (due)] TJ ET\n\
                    BT /F1 12 Tf 72 650 Td (Wire) Tj ET\n\
                    BT /F1 12 Tf 72 600 Td [(Nov) 20 (ember)] TJ ET";
    let pdf = build_pdf(&[content], None);
    let doc = PdfDocument::open_bytes(pdf).unwrap();

    let text = collapse_ws(&doc.text().unwrap());
    assert!(text.contains("Amount due"), "text was: {text:?}");
    assert!(text.contains("Wire"), "text was: {text:?}");
    assert!(text.contains("November"), "text was: {text:?}");
    assert!(!text.contains("Nov ember"), "TJ kerning adjustment must not be read as a space: {text:?}");
}

#[test]
fn reading_order_follows_device_space_not_draw_order_after_a_y_flip_ctm() {
    // `cm` flips the y axis; the five rows are drawn out of order in the
    // stream, and final reading order must still run top-to-bottom in
    // device space (Row1..Row5), not stream order.
    let content = b"q 1 0 0 -1 0 792 cm\n\
                    BT /F1 12 Tf 50 300 Td (Row3) Tj ET\n\
                    BT /F1 12 Tf 50 500 Td (Row5) Tj ET\n\
                    BT /F1 12 Tf 50 100 Td (Row1) Tj ET\n\
                    BT /F1 12 Tf 50 400 Td (Row4) Tj ET\n\
                    BT /F1 12 Tf 50 200 Td (Row2) Tj ET\n\
                    Q";
    let pdf = build_pdf(&[content], None);
    let doc = PdfDocument::open_bytes(pdf).unwrap();

    let text = doc.text().unwrap();
    let positions: Vec<usize> = ["Row1", "Row2", "Row3", "Row4", "Row5"].iter().map(|row| text.find(row).unwrap_or_else(|| panic!("{row} missing from {text:?}"))).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "rows out of reading order: {positions:?} in {text:?}");
}

#[test]
fn strips_docusign_style_placeholders_while_keeping_real_names() {
    let content = b"BT /F1 12 Tf 72 700 Td (Alice Smith \\\\TAG1\\\\ signed) Tj ET\n\
                    BT /F1 12 Tf 72 650 Td (Bob Jones \\\\TAG2\\\\ signed) Tj ET\n\
                    BT /F1 12 Tf 72 600 Td (Carol Lee \\\\TAG3\\\\ signed) Tj ET";
    let pdf = build_pdf(&[content], None);
    let doc = PdfDocument::open_bytes(pdf).unwrap();

    let text = doc.text().unwrap();
    for name in ["Alice Smith", "Bob Jones", "Carol Lee"] {
        assert!(text.contains(name), "expected {name:?} in {text:?}");
    }
    for tag in ["TAG1", "TAG2", "TAG3"] {
        assert!(!text.contains(tag), "placeholder {tag:?} should have been stripped from {text:?}");
    }
}

proptest! {
    // Re-opening a fresh Parser per accessor call (§6's no-persistent-cache
    // design) must never make extraction order- or call-dependent: same
    // bytes in, same text out, every time.
    #[test]
    fn text_extraction_is_deterministic_across_repeated_calls(
        words in proptest::collection::vec("[a-z]{1,8}", 1..6),
        font_size in 6.0f32..24.0,
        x in 50.0f32..500.0,
    ) {
        let line = words.join(" ");
        let content = format!("BT /F1 {font_size} Tf {x} 700 Td ({line}) Tj ET");
        let pdf = build_pdf(&[content.as_bytes()], None);
        let doc = PdfDocument::open_bytes(pdf).unwrap();

        let first = doc.text().unwrap();
        let second = doc.text().unwrap();
        prop_assert_eq!(&first, &second, "re-opening a fresh parser per call must not change the result");
        for word in &words {
            prop_assert!(first.contains(word.as_str()), "{:?} missing from {:?}", word, first);
        }
    }
}

#[test]
fn disposed_document_returns_empty_text_instead_of_erroring() {
    let pdf = build_pdf(&[b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET"], None);
    let mut doc = PdfDocument::open_bytes(pdf).unwrap();
    assert!(!doc.text().unwrap().is_empty());

    doc.dispose();
    assert!(doc.is_disposed());
    assert_eq!(doc.text().unwrap(), "");
    assert_eq!(doc.markdown().unwrap(), "");
    assert!(doc.page_info(0).is_err());
}
