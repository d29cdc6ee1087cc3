use crate::error::CliError;
use connectors::seed::SeedReport;
use model::{pagination::page::Page, records::row::Row};
use serde_json::json;
use std::io::Write;

/// One row as a JSON object on its own line.
pub fn write_row(out: &mut impl Write, row: &Row) -> Result<(), CliError> {
    serde_json::to_writer(&mut *out, &row.to_json())?;
    writeln!(out)?;
    Ok(())
}

pub fn write_page_header(out: &mut impl Write, index: u64, page: &Page<Row>) -> Result<(), CliError> {
    let header = json!({ "page": index, "offset": page.offset, "rows": page.len() });
    serde_json::to_writer(&mut *out, &header)?;
    writeln!(out)?;
    Ok(())
}

pub fn average_line(column: &str, mean: Option<f64>) -> String {
    match mean {
        Some(mean) => format!("Average {column} of users: {mean:.2}"),
        None => "No users found.".to_string(),
    }
}

pub fn seed_summary(table: &str, report: &SeedReport) -> String {
    format!(
        "Seeded {table}: {} inserted, {} skipped (email already present)",
        report.inserted, report.skipped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::{FieldValue, Value};

    fn row(name: &str, age: i64) -> Row {
        Row::new(
            "user_data",
            vec![
                FieldValue::new("name", Value::String(name.into())),
                FieldValue::new("age", Value::Int(age)),
            ],
        )
    }

    #[test]
    fn rows_are_json_lines_in_column_order() {
        let mut out = Vec::new();
        write_row(&mut out, &row("Ann", 31)).unwrap();
        write_row(&mut out, &row("Bob", 40)).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"name\":\"Ann\",\"age\":31}\n{\"name\":\"Bob\",\"age\":40}\n"
        );
    }

    #[test]
    fn page_header_reports_position() {
        let page = Page::new(20, vec![row("Ann", 31), row("Bob", 40)]);
        let mut out = Vec::new();
        write_page_header(&mut out, 2, &page).unwrap();

        let header: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(header, json!({ "page": 2, "offset": 20, "rows": 2 }));
    }

    #[test]
    fn average_formatting() {
        assert_eq!(average_line("age", Some(52.0 / 3.0)), "Average age of users: 17.33");
        assert_eq!(average_line("age", None), "No users found.");
    }
}
