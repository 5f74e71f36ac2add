//! Tabular file sources for bulk loading.
//!
//! Each reader produces a [`TextTable`]: a header row plus string records,
//! regardless of whether the source was a delimited text file, an Excel
//! sheet, or a table inside a PDF page. Type coercion happens later, at
//! load time, where the caller knows the target column types.

pub mod delimited;
pub mod excel;
pub mod pdf;
pub mod table;

pub use delimited::{read_delimited, DelimitedOptions, Delimiter};
pub use excel::read_sheet;
pub use pdf::read_pdf_table;
pub use table::TextTable;
