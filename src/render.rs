use crate::assignment::{ReportSummary, RubricReport};
use crate::flatten::FlatTable;
use tabled::builder::Builder;
use tabled::settings::{object::Rows, Modify, Style, Width};

/// Renders the table for the terminal. Columns are only known at runtime, so the
/// table goes through `tabled`'s builder rather than a derived `Tabled` type.
pub fn render_table(table: &FlatTable) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().cloned());
    for row in &table.rows {
        builder.push_record(row.values.iter().map(|v| v.to_string()));
    }

    let mut rendered = builder.build();
    rendered
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(32).keep_words(true)))
        .with(Style::modern());
    rendered.to_string()
}

pub fn render_summary(summary: &ReportSummary) -> String {
    let mut text = format!(
        "{} submissions: {} assessed ({} partially), {} without rubric assessment",
        summary.submissions, summary.assessed, summary.partially_assessed, summary.unassessed
    );
    if summary.malformed_entries > 0 {
        text.push_str(&format!(
            "; {} malformed entries left blank",
            summary.malformed_entries
        ));
    }
    text
}

/// Heading, rubric title, summary and table of a report.
pub fn render_report(report: &RubricReport) -> String {
    format!(
        "{} ({})\nRubric: {}\nRater policy: {}\n{}\n{}",
        report.assignment_name.as_deref().unwrap_or("Unnamed assignment"),
        report.assignment_id.as_deref().unwrap_or("?"),
        report.rubric_title.as_deref().unwrap_or("Untitled rubric"),
        report.policy,
        render_summary(&report.summary),
        render_table(&report.table)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{CellValue, FlatRow};

    #[test]
    fn test_render_table_contains_cells() {
        let table = FlatTable {
            columns: vec!["Student Name".to_string(), "Clarity Points".to_string()],
            criteria: Vec::new(),
            rows: vec![FlatRow {
                values: vec![CellValue::Text("Ada".to_string()), CellValue::Number(4.5)],
            }],
        };

        let rendered = render_table(&table);
        assert!(rendered.contains("Student Name"));
        assert!(rendered.contains("Clarity Points"));
        assert!(rendered.contains("Ada"));
        assert!(rendered.contains("4.5"));
    }

    #[test]
    fn test_render_summary() {
        let summary = ReportSummary {
            submissions: 3,
            assessed: 2,
            partially_assessed: 1,
            unassessed: 1,
            malformed_entries: 0,
        };
        assert_eq!(
            render_summary(&summary),
            "3 submissions: 2 assessed (1 partially), 1 without rubric assessment"
        );

        let with_malformed = ReportSummary {
            malformed_entries: 2,
            ..summary
        };
        assert!(render_summary(&with_malformed).ends_with("; 2 malformed entries left blank"));
    }
}
