use crate::error::Result;
use crate::types::ResultTable;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Export a result table with its original column headings. An empty table
/// still produces a file, with no rows.
pub fn write_result_csv(path: impl AsRef<Path>, table: &ResultTable) -> Result<()> {
    match table {
        ResultTable::Empty => {
            std::fs::write(path, "")?;
            Ok(())
        }
        ResultTable::TopCrops(rows) => write_csv(path, rows),
        ResultTable::Rainfall(rows) => write_csv(path, rows),
        ResultTable::Comparison(rows) => write_csv(path, rows),
        ResultTable::Production(rows) => write_csv(path, rows),
    }
}

pub fn render_table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

/// Markdown preview of at most `max_rows` rows.
pub fn render_result(table: &ResultTable, max_rows: usize) -> String {
    match table {
        ResultTable::Empty => "(no rows)".to_string(),
        ResultTable::TopCrops(rows) => render_table_rows(rows, max_rows),
        ResultTable::Rainfall(rows) => render_table_rows(rows, max_rows),
        ResultTable::Comparison(rows) => render_table_rows(rows, max_rows),
        ResultTable::Production(rows) => render_table_rows(rows, max_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CropTotalRow;

    fn crops() -> ResultTable {
        ResultTable::TopCrops(vec![
            CropTotalRow {
                crop: "Rice".into(),
                total_production: 1234.0,
                avg_production: 617.0,
                years_available: 2,
            },
            CropTotalRow {
                crop: "Maize".into(),
                total_production: 10.0,
                avg_production: 5.0,
                years_available: 2,
            },
        ])
    }

    #[test]
    fn preview_uses_markdown_and_respects_row_cap() {
        let text = render_result(&crops(), 1);
        assert!(text.contains("| Crop"));
        assert!(text.contains("1,234"));
        assert!(!text.contains("Maize"));
        assert_eq!(render_result(&ResultTable::Empty, 5), "(no rows)");
    }

    #[test]
    fn csv_export_keeps_column_headings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_result_csv(&path, &crops()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Crop,Total_Production,Avg_Production,Years_Available")
        );
        assert_eq!(lines.next(), Some("Rice,1234.0,617.0,2"));
    }
}
