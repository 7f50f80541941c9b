//! Flat tabular export of a filtered, sorted risk list.

use crate::risk::Risk;
use std::io::{self, Write};

/// Column order of every export.
pub const CSV_COLUMNS: [&str; 8] = [
    "title",
    "category",
    "probability",
    "impact",
    "score",
    "status",
    "owner",
    "project",
];

/// Quote a field if it contains a delimiter, quote or line break.
pub fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn csv_row(risk: &Risk) -> String {
    let fields = [
        csv_escape(&risk.title),
        risk.category.to_string(),
        risk.probability().to_string(),
        risk.impact().to_string(),
        risk.risk_score().to_string(),
        risk.status.to_string(),
        csv_escape(risk.owner_label()),
        csv_escape(risk.project_name()),
    ];
    fields.join(",")
}

pub fn write_csv<W: Write>(writer: &mut W, risks: &[Risk]) -> io::Result<()> {
    writeln!(writer, "{}", CSV_COLUMNS.join(","))?;
    for risk in risks {
        writeln!(writer, "{}", csv_row(risk))?;
    }
    writer.flush()
}

pub fn render_csv(risks: &[Risk]) -> String {
    let mut buffer = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_csv(&mut buffer, risks);
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{Category, Level, OwnerRef};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn risk(title: &str) -> Risk {
        let day = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        Risk::new("r", title, Category::Financial, Level::High, Level::Low, day)
    }

    #[test]
    fn test_escape_only_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_render_fixed_columns() {
        let owned = risk("Cash flow, Q3")
            .with_owner(OwnerRef {
                id: "u1".into(),
                display_name: None,
                email: Some("cfo@example.com".into()),
            })
            .with_project("p1", Some("Expansion"));
        let csv = render_csv(&[owned, risk("Audit")]);
        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            vec![
                "title,category,probability,impact,score,status,owner,project",
                "\"Cash flow, Q3\",financial,high,low,8,identified,cfo@example.com,Expansion",
                "Audit,financial,high,low,8,identified,,",
            ]
        );
    }

    #[test]
    fn test_empty_list_still_has_header() {
        assert_eq!(render_csv(&[]).lines().count(), 1);
    }
}
