use crate::io::output::OutputWriter;
use crate::risk::{classify, Level, Risk, SeverityTier};
use crate::view::{CategorySummary, GlobalStatistics, RiskMatrix};
use colored::*;
use std::io::Write;

const RULE: &str = "───────────────────────────────────────────";

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn heading(&mut self, title: &str) -> anyhow::Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", title.bold())?;
        writeln!(self.writer, "{RULE}")?;
        Ok(())
    }
}

fn paint(tier: SeverityTier, text: &str) -> ColoredString {
    match tier {
        SeverityTier::Critical => text.red().bold(),
        SeverityTier::High => text.red(),
        SeverityTier::Medium => text.yellow(),
        SeverityTier::Low => text.green(),
    }
}

fn short_level(level: Level) -> &'static str {
    match level {
        Level::VeryLow => "VL",
        Level::Low => "L",
        Level::Medium => "M",
        Level::High => "H",
        Level::VeryHigh => "VH",
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_risks(&mut self, risks: &[Risk], total: usize) -> anyhow::Result<()> {
        self.heading(&format!("RISKS ({} of {})", risks.len(), total))?;
        if risks.is_empty() {
            writeln!(self.writer, "  No risks match the current filters.")?;
            return Ok(());
        }
        for risk in risks {
            let tier = risk.severity();
            let score = format!("{:>2}", risk.risk_score());
            writeln!(
                self.writer,
                "  [{}] {:<8} {}",
                paint(tier, &score),
                paint(tier, tier.label()),
                risk.title.bold()
            )?;
            let mut details = vec![
                risk.category.to_string(),
                risk.status.to_string(),
                format!("P:{} I:{}", risk.probability(), risk.impact()),
            ];
            if !risk.owner_label().is_empty() {
                details.push(format!("owner: {}", risk.owner_label()));
            }
            if !risk.project_name().is_empty() {
                details.push(format!("project: {}", risk.project_name()));
            }
            if let Some(review) = risk.review_date {
                details.push(format!("review: {}", review.format("%Y-%m-%d")));
            }
            writeln!(self.writer, "       {}", details.join(" · ").dimmed())?;
        }
        Ok(())
    }

    fn write_matrix(&mut self, matrix: &RiskMatrix) -> anyhow::Result<()> {
        self.heading("RISK MATRIX (probability × impact)")?;
        write!(self.writer, "      ")?;
        for impact in Level::ALL {
            write!(self.writer, "{:>5}", short_level(impact))?;
        }
        writeln!(self.writer)?;

        // highest probability on top
        for probability in Level::ALL.into_iter().rev() {
            write!(self.writer, "  {:>3} ", short_level(probability))?;
            for impact in Level::ALL {
                let score = crate::risk::score(probability, impact);
                let count = matrix.count(probability, impact);
                let cell = format!("{count:>5}");
                if count == 0 {
                    write!(self.writer, "{}", cell.dimmed())?;
                } else {
                    write!(self.writer, "{}", paint(classify(score), &cell))?;
                }
            }
            writeln!(self.writer)?;
        }
        writeln!(self.writer)?;
        writeln!(self.writer, "  {} risks placed", matrix.total_risks())?;
        Ok(())
    }

    fn write_summaries(&mut self, summaries: &[CategorySummary]) -> anyhow::Result<()> {
        self.heading("CATEGORY SUMMARY")?;
        if summaries.is_empty() {
            writeln!(self.writer, "  No risks to summarize.")?;
            return Ok(());
        }
        for summary in summaries {
            writeln!(
                self.writer,
                "  {:<14} total {:>3}  avg {:>2}  {} {} {} {}",
                summary.category.to_string().bold(),
                summary.total,
                summary.average_score,
                paint(SeverityTier::Critical, &format!("C:{}", summary.critical)),
                paint(SeverityTier::High, &format!("H:{}", summary.high)),
                paint(SeverityTier::Medium, &format!("M:{}", summary.medium)),
                paint(SeverityTier::Low, &format!("L:{}", summary.low)),
            )?;
            for risk in &summary.top_risks {
                writeln!(
                    self.writer,
                    "      {} {}",
                    paint(risk.severity(), &format!("{:>2}", risk.risk_score())),
                    risk.title
                )?;
            }
        }
        Ok(())
    }

    fn write_statistics(&mut self, statistics: &GlobalStatistics) -> anyhow::Result<()> {
        self.heading("STATISTICS")?;
        writeln!(self.writer, "  Total:    {}", statistics.total)?;
        let rows = [
            (SeverityTier::Critical, statistics.critical),
            (SeverityTier::High, statistics.high),
            (SeverityTier::Medium, statistics.medium),
            (SeverityTier::Low, statistics.low),
        ];
        for (tier, count) in rows {
            writeln!(
                self.writer,
                "  {:<9} {}",
                format!("{}:", tier.label()),
                paint(tier, &count.to_string())
            )?;
        }
        let overdue = statistics.overdue.to_string();
        writeln!(
            self.writer,
            "  Overdue:  {}",
            if statistics.overdue > 0 {
                overdue.red()
            } else {
                overdue.normal()
            }
        )?;
        Ok(())
    }
}
