//! CSV reading and writing for tables

use crate::error::Result;
use crate::table::{Column, Table};
use std::path::Path;

/// Load one CSV file with a header row, inferring a type per column
pub fn read_csv(path: &Path, name: &str) -> Result<Table> {
    tracing::debug!("Reading table from {:?}", path);

    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (i, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(i).unwrap_or("").trim().to_string());
        }
    }

    let n_rows = raw.first().map(Vec::len).unwrap_or(0);
    let mut table = Table::empty(name, n_rows);
    for (header, cells) in headers.into_iter().zip(raw) {
        table = table.with_column(header, infer_column(&cells))?;
    }
    Ok(table)
}

/// Pick the narrowest type every non-empty cell parses as: int, float, bool, text
///
/// A column without any value is an all-null text column; it takes the type
/// of whatever it is later concatenated with.
pub fn infer_column(cells: &[String]) -> Column {
    let filled = || cells.iter().filter(|c| !c.is_empty());
    if filled().next().is_none() {
        return Column::Text(vec![None; cells.len()]);
    }

    if filled().all(|c| c.parse::<i64>().is_ok()) {
        return Column::Int(cells.iter().map(|c| c.parse().ok()).collect());
    }
    if filled().all(|c| c.parse::<f64>().is_ok()) {
        return Column::Float(cells.iter().map(|c| c.parse().ok()).collect());
    }
    if filled().all(|c| parse_bool(c).is_some()) {
        return Column::Bool(cells.iter().map(|c| parse_bool(c)).collect());
    }
    Column::Text(cells.iter().map(|c| (!c.is_empty()).then(|| c.clone())).collect())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" | "T" => Some(true),
        "false" | "False" | "FALSE" | "F" => Some(false),
        _ => None,
    }
}

/// Write a table as CSV; null cells are written empty
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut w = csv::Writer::from_path(path)?;
    w.write_record(table.column_names())?;

    let columns: Vec<&Column> = table.columns().map(|(_, c)| c).collect();
    for row in 0..table.n_rows() {
        w.write_record(columns.iter().map(|c| c.render(row).unwrap_or_default()))?;
    }
    w.flush()?;

    tracing::debug!("Wrote {} rows to {:?}", table.n_rows(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_infer_types() {
        assert_eq!(infer_column(&cells(&["1", "", "3"])), Column::Int(vec![Some(1), None, Some(3)]));
        assert_eq!(infer_column(&cells(&["1", "2.5"])), Column::Float(vec![Some(1.0), Some(2.5)]));
        assert_eq!(infer_column(&cells(&["T", "false"])), Column::Bool(vec![Some(true), Some(false)]));
        assert_eq!(
            infer_column(&cells(&["PSF", ""])),
            Column::Text(vec![Some("PSF".to_string()), None])
        );
        assert_eq!(infer_column(&cells(&["", ""])), Column::Text(vec![None, None]));
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let table = Table::from_columns(
            "t",
            vec![
                ("IDENT".to_string(), Column::Int(vec![Some(0), Some(1)])),
                ("g".to_string(), Column::Float(vec![Some(1.5e-29), Some(-99.0)])),
                ("String".to_string(), Column::Text(vec![Some("130.1 0.5 3 3".into()), None])),
            ],
        )
        .unwrap();

        write_csv(&table, &path).unwrap();
        let back = read_csv(&path, "t").unwrap();
        assert_eq!(back, table);
    }
}
