//! Error types for the PDF reader.
//!
//! Two propagation policies meet here (§7 of the design spec): structural
//! failures bubble as [`Error`] immediately, while content-level glitches are
//! tolerated locally and never reach this type at all.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy at the crate boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed PDF beyond recovery: xref unreadable and the scan fallback
    /// also failed, `/Root` missing, a stream's length is unresolvable with
    /// no `endstream` in sight, or a Flate payload won't decode even in
    /// relaxed mode.
    #[error("failed to parse PDF at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the failure was detected, if one is known.
        offset: usize,
        /// Human-readable reason.
        reason: String,
    },

    /// The PDF is well-formed but asks for something out of scope: a
    /// non-empty password, AES-256/V5+, a non-Standard security filter, or a
    /// missing `/ID` alongside `/Encrypt`.
    #[error("unsupported PDF feature: {0}")]
    Unsupported(String),

    /// Cross-reference structure (table or stream) could not be parsed.
    #[error("invalid cross-reference table")]
    InvalidXref,

    /// An indirect reference points at an object number the xref table has
    /// no entry for.
    #[error("object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// A COS object was accessed through the wrong accessor.
    #[error("invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected type name.
        expected: String,
        /// Actual type name encountered.
        found: String,
    },

    /// I/O failure from an ambient convenience (e.g. `PdfDocument::open_path`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stream filter pipeline could not decode its input.
    #[error("stream decode error: {0}")]
    Decode(String),

    /// Indirect-reference resolution recursed past the depth cap (§3:
    /// capped at 100) without bottoming out; the resolver returns `Null`
    /// rather than propagating this in practice, but it is kept for callers
    /// that want to observe the cycle directly.
    #[error("recursion limit exceeded (max {0})")]
    RecursionLimitExceeded(u32),
}

impl Error {
    /// Build an [`Error::ParseError`] at a known byte offset.
    pub fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Error::ParseError { offset, reason: reason.into() }
    }

    /// Build an [`Error::Unsupported`].
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Error::Unsupported(reason.into())
    }

    /// True for the `Unsupported` variant — callers distinguishing the two
    /// top-level error kinds (§6) usually just match, but this is convenient
    /// for quick checks in tests.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_formats_offset_and_reason() {
        let err = Error::parse(1234, "invalid token");
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("invalid token"));
    }

    #[test]
    fn unsupported_error_is_distinguishable() {
        let err = Error::unsupported("encrypted PDF requires a password");
        assert!(err.is_unsupported());
        assert!(!Error::InvalidXref.is_unsupported());
    }

    #[test]
    fn object_not_found_formats_ref() {
        let err = Error::ObjectNotFound(10, 0);
        assert_eq!(format!("{}", err), "object not found: 10 0 R");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
