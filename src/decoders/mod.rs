//! Stream filter pipeline (§4.4): `FlateDecode`/`Fl`, `ASCIIHexDecode`/`AHx`,
//! `ASCII85Decode`/`A85`, `LZWDecode`/`LZW`, followed by an optional PNG or
//! TIFF predictor. Filters run left-to-right; an unrecognized filter name
//! passes its bytes through unchanged, a local tolerance kept behind
//! [`crate::parser_config::ParserOptions::pass_through_unknown_filters`].

mod ascii85;
mod ascii_hex;
mod flate;
mod lzw;
mod predictor;

pub use predictor::{DecodeParams, PngPredictor, decode_predictor};

use crate::error::Result;
use crate::object::Dict;
use crate::primitives::Primitives;

/// Decode a stream payload through its filter pipeline (§4.4). `filters`
/// and `parms` have already been resolved from `/Filter`/`/DecodeParms` by
/// the caller (the parser, which alone can chase indirect references).
pub fn decode_stream(data: &[u8], filters: &[String], parms: &[Option<Dict>], primitives: &Primitives) -> Result<Vec<u8>> {
    let mut current = data.to_vec();
    for (i, name) in filters.iter().enumerate() {
        let parm = parms.get(i).and_then(|p| p.as_ref());
        current = match canonical_filter_name(name) {
            Some("FlateDecode") => flate::decode(&current, primitives)?,
            Some("ASCIIHexDecode") => ascii_hex::decode(&current)?,
            Some("ASCII85Decode") => ascii85::decode(&current)?,
            Some("LZWDecode") => {
                let early_change = parm.and_then(|d| d.get("EarlyChange")).and_then(|o| o.as_int()).unwrap_or(1) != 0;
                lzw::decode(&current, early_change)?
            },
            _ => {
                log::warn!("unrecognized stream filter '{}', passing bytes through unchanged", name);
                current
            },
        };
        if let Some(parm) = parm {
            current = apply_predictor_if_present(&current, parm)?;
        }
    }
    Ok(current)
}

fn canonical_filter_name(name: &str) -> Option<&'static str> {
    match name {
        "FlateDecode" | "Fl" => Some("FlateDecode"),
        "ASCIIHexDecode" | "AHx" => Some("ASCIIHexDecode"),
        "ASCII85Decode" | "A85" => Some("ASCII85Decode"),
        "LZWDecode" | "LZW" => Some("LZWDecode"),
        _ => None,
    }
}

fn apply_predictor_if_present(data: &[u8], parm: &Dict) -> Result<Vec<u8>> {
    let predictor = parm.get("Predictor").and_then(|o| o.as_int()).unwrap_or(1);
    if predictor <= 1 {
        return Ok(data.to_vec());
    }
    let columns = parm.get("Columns").and_then(|o| o.as_int()).unwrap_or(1);
    if columns <= 0 {
        // §4.4: a non-positive /Columns makes the predictor a no-op, guarding
        // against maliciously crafted params rather than dividing by zero.
        return Ok(data.to_vec());
    }
    let params = DecodeParams {
        predictor,
        columns: columns as usize,
        colors: parm.get("Colors").and_then(|o| o.as_int()).unwrap_or(1) as usize,
        bits_per_component: parm.get("BitsPerComponent").and_then(|o| o.as_int()).unwrap_or(8) as usize,
    };
    decode_predictor(data, &params)
}
