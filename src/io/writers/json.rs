use crate::io::output::OutputWriter;
use crate::risk::Risk;
use crate::view::{CategorySummary, GlobalStatistics, RiskMatrix};
use serde::Serialize;
use std::io::Write;

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn emit<T: Serialize + ?Sized>(&mut self, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct RiskList<'a> {
    total: usize,
    shown: usize,
    risks: &'a [Risk],
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_risks(&mut self, risks: &[Risk], total: usize) -> anyhow::Result<()> {
        self.emit(&RiskList {
            total,
            shown: risks.len(),
            risks,
        })
    }

    fn write_matrix(&mut self, matrix: &RiskMatrix) -> anyhow::Result<()> {
        self.emit(matrix)
    }

    fn write_summaries(&mut self, summaries: &[CategorySummary]) -> anyhow::Result<()> {
        self.emit(summaries)
    }

    fn write_statistics(&mut self, statistics: &GlobalStatistics) -> anyhow::Result<()> {
        self.emit(statistics)
    }
}
