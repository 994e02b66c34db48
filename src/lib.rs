pub mod flatten;
pub mod source;
pub mod table;
pub mod workbook;

pub use flatten::{enrich, Record};
pub use table::Table;
