//! Adobe Glyph List lookup (§4.7): maps a PostScript glyph name to the
//! Unicode text it represents. Covers the common named entries plus the
//! two algorithmic forms real subsetted fonts actually emit —
//! `uniXXXX` (exactly 4 hex digits) and `uXXXXX...` (4-6 hex digits).

/// Resolve a glyph name to Unicode text, if known.
pub fn glyph_name_to_unicode(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return char::from_u32(code).map(|c| c.to_string());
            }
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return char::from_u32(code).map(|c| c.to_string());
            }
        }
    }
    named_entry(name).map(|c| c.to_string())
}

/// A deliberately partial slice of the Adobe Glyph List: the names that
/// actually show up in `/Differences` arrays in practice (ASCII, common
/// punctuation, ligatures, accented Latin). Anything else falls through
/// to the `uniXXXX`/`uXXXXX` algorithmic forms above.
fn named_entry(name: &str) -> Option<char> {
    Some(match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "hyphenminus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "quotesinglbase" => '\u{201A}',
        "quotedblbase" => '\u{201E}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "dagger" => '\u{2020}',
        "daggerdbl" => '\u{2021}',
        "perthousand" => '\u{2030}',
        "trademark" => '\u{2122}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        "ff" => '\u{FB00}',
        "ffi" => '\u{FB03}',
        "ffl" => '\u{FB04}',
        "copyright" => '\u{00A9}',
        "registered" => '\u{00AE}',
        "degree" => '\u{00B0}',
        "Euro" => '\u{20AC}',
        "minus" => '\u{2212}',
        "multiply" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "plusminus" => '\u{00B1}',
        "Adieresis" => '\u{00C4}',
        "adieresis" => '\u{00E4}',
        "Odieresis" => '\u{00D6}',
        "odieresis" => '\u{00F6}',
        "Udieresis" => '\u{00DC}',
        "udieresis" => '\u{00FC}',
        "eacute" => '\u{00E9}',
        "Eacute" => '\u{00C9}',
        "egrave" => '\u{00E8}',
        "agrave" => '\u{00E0}',
        "ccedilla" => '\u{00E7}',
        "Ccedilla" => '\u{00C7}',
        "ntilde" => '\u{00F1}',
        "Ntilde" => '\u{00D1}',
        "germandbls" => '\u{00DF}',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_uni_form() {
        assert_eq!(glyph_name_to_unicode("uni00E9"), Some("\u{00E9}".to_string()));
    }

    #[test]
    fn decodes_u_form() {
        assert_eq!(glyph_name_to_unicode("u1F600"), Some("\u{1F600}".to_string()));
    }

    #[test]
    fn resolves_named_entry() {
        assert_eq!(glyph_name_to_unicode("bullet"), Some("\u{2022}".to_string()));
        assert_eq!(glyph_name_to_unicode("fi"), Some("\u{FB01}".to_string()));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(glyph_name_to_unicode("totallyMadeUp"), None);
    }
}
