use crate::risk::Risk;
use crate::view::{CategorySummary, GlobalStatistics, RiskMatrix};
use std::io::Write;

use super::writers::{CsvWriter, JsonWriter, TerminalWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Csv,
}

/// Renders each derived view in one output format.
pub trait OutputWriter {
    /// `total` is the collection size before filtering.
    fn write_risks(&mut self, risks: &[Risk], total: usize) -> anyhow::Result<()>;
    fn write_matrix(&mut self, matrix: &RiskMatrix) -> anyhow::Result<()>;
    fn write_summaries(&mut self, summaries: &[CategorySummary]) -> anyhow::Result<()>;
    fn write_statistics(&mut self, statistics: &GlobalStatistics) -> anyhow::Result<()>;
}

pub fn create_writer<'a, W: Write + 'a>(
    format: OutputFormat,
    writer: W,
) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Csv => Box::new(CsvWriter::new(writer)),
    }
}
