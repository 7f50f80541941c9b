use crate::io::csv::{csv_escape, write_csv};
use crate::io::output::OutputWriter;
use crate::risk::Risk;
use crate::view::{CategorySummary, GlobalStatistics, RiskMatrix};
use std::io::Write;

/// Tabular output; the risk list uses the export column layout.
pub struct CsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for CsvWriter<W> {
    fn write_risks(&mut self, risks: &[Risk], _total: usize) -> anyhow::Result<()> {
        write_csv(&mut self.writer, risks)?;
        Ok(())
    }

    fn write_matrix(&mut self, matrix: &RiskMatrix) -> anyhow::Result<()> {
        writeln!(self.writer, "probability,impact,score,count")?;
        for cell in matrix.cells() {
            writeln!(
                self.writer,
                "{},{},{},{}",
                cell.probability,
                cell.impact,
                cell.score,
                cell.risks.len()
            )?;
        }
        Ok(())
    }

    fn write_summaries(&mut self, summaries: &[CategorySummary]) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "category,total,critical,high,medium,low,average_score,top_risks"
        )?;
        for summary in summaries {
            let top: Vec<&str> = summary.top_risks.iter().map(|r| r.title.as_str()).collect();
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{}",
                summary.category,
                summary.total,
                summary.critical,
                summary.high,
                summary.medium,
                summary.low,
                summary.average_score,
                csv_escape(&top.join("; "))
            )?;
        }
        Ok(())
    }

    fn write_statistics(&mut self, statistics: &GlobalStatistics) -> anyhow::Result<()> {
        writeln!(self.writer, "total,critical,high,medium,low,overdue")?;
        writeln!(
            self.writer,
            "{},{},{},{},{},{}",
            statistics.total,
            statistics.critical,
            statistics.high,
            statistics.medium,
            statistics.low,
            statistics.overdue
        )?;
        Ok(())
    }
}
