//! Text extraction and table reconstruction
//!
//! [`extraction`] places the text of a page in page space, [`table`] turns
//! that layout into rows and cells. [`font`], [`cmap`] and [`encoding`]
//! map character codes to Unicode and glyph advances.

pub mod cmap;
pub mod encoding;
pub mod extraction;
pub mod font;
pub mod table;

pub use cmap::CMap;
pub use encoding::{decode_text_string, TextEncoding};
pub use extraction::{
    extract_layout, extract_page_layout, PageLayout, RulingLine, TextFragment,
};
pub use font::{FontDecoder, FontSet, Glyph};
pub use table::{
    HeaderHeuristic, SeparatorMode, Table, TableOptions, TableReconstructor, TableRow,
};
