//! Layout analysis: table detection (§4.9) over a page's positioned text
//! runs.

pub mod table_detector;

pub use table_detector::{detect_tables, Table};
