pub mod csv;
pub mod output;
pub mod writers;

pub use csv::{csv_escape, render_csv, write_csv, CSV_COLUMNS};
pub use output::{create_writer, OutputFormat, OutputWriter};
