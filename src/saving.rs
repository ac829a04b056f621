use rust_xlsxwriter::{Formula, Workbook, Worksheet};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::WorkbookError;
use crate::loader::{RawSheet, Row};

/// Build a fresh sheet from header-keyed rows.
///
/// The header row is the union of the row keys in first-seen order, or
/// `default_headers` when there are no rows, so an emptied sheet keeps its schema.
pub fn build_sheet(name: &str, default_headers: &[&str], rows: &[Row]) -> RawSheet {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        headers = default_headers.iter().map(|h| h.to_string()).collect();
    }

    let mut grid = Vec::with_capacity(rows.len() + 1);
    grid.push(headers.iter().map(|h| Some(Value::String(h.clone()))).collect());
    for row in rows {
        grid.push(
            headers
                .iter()
                .map(|h| row.get(h).filter(|v| !v.is_null()).cloned())
                .collect(),
        );
    }

    RawSheet {
        name: name.to_string(),
        origin: (0, 0),
        grid,
        formulas: Vec::new(),
    }
}

/// Write all sheets to `path`, replacing the previous file.
///
/// The workbook is rendered in memory and moved into place through a temporary
/// file in the same directory, so a reader sees either the old or the new file.
pub fn write_workbook(path: impl AsRef<Path>, sheets: &[RawSheet]) -> Result<(), WorkbookError> {
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_grid(worksheet, sheet)?;
    }

    let buffer = workbook.save_to_buffer()?;
    replace_file(path.as_ref(), &buffer)
}

fn column(col: u32) -> Result<u16, WorkbookError> {
    u16::try_from(col).map_err(|_| WorkbookError::Write(format!("column {} out of range", col)))
}

/// Cached result stored alongside a formula, so readers that do not
/// recalculate still see the last value.
fn formula_result(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

fn write_grid(worksheet: &mut Worksheet, sheet: &RawSheet) -> Result<(), WorkbookError> {
    let mut formula_cells = HashSet::new();
    for (row, col, formula) in &sheet.formulas {
        let mut cell = Formula::new(formula);
        if let Some(value) = sheet.value_at(*row, *col) {
            cell = cell.set_result(formula_result(value));
        }
        worksheet.write_formula(*row, column(*col)?, cell)?;
        formula_cells.insert((*row, *col));
    }

    let (row0, col0) = sheet.origin;
    for (r, cells) in sheet.grid.iter().enumerate() {
        for (c, cell) in cells.iter().enumerate() {
            let Some(value) = cell else { continue };
            let row = row0 + r as u32;
            let col = col0 + c as u32;
            if formula_cells.contains(&(row, col)) {
                continue;
            }
            let col = column(col)?;

            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Value::Number(n) => {
                    worksheet.write_number(row, col, n.as_f64().unwrap_or(0.0))?;
                }
                Value::String(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                other => {
                    worksheet.write_string(row, col, &other.to_string())?;
                }
            }
        }
    }
    Ok(())
}

fn replace_file(path: &Path, contents: &[u8]) -> Result<(), WorkbookError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| WorkbookError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_workbook;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn headers_follow_first_seen_key_order() {
        let rows = vec![
            row(&[("ID", json!("A")), ("Label", json!("x"))]),
            row(&[("ID", json!("B")), ("Extra", json!(1))]),
        ];
        let sheet = build_sheet("SKUs", &["ID"], &rows);

        assert_eq!(
            sheet.grid[0],
            vec![Some(json!("ID")), Some(json!("Label")), Some(json!("Extra"))]
        );
        assert_eq!(sheet.grid[2], vec![Some(json!("B")), None, Some(json!(1))]);
    }

    #[test]
    fn empty_sheet_keeps_default_headers() {
        let sheet = build_sheet("Stores", &["Seq No.", "ID"], &[]);
        assert_eq!(sheet.grid.len(), 1);
        assert_eq!(sheet.grid[0], vec![Some(json!("Seq No.")), Some(json!("ID"))]);
    }

    #[test]
    fn written_workbook_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let first = build_sheet("A", &[], &[row(&[("n", json!(1)), ("s", json!("x"))])]);
        let second = build_sheet("B", &[], &[row(&[("flag", json!(true))])]);
        write_workbook(&path, &[first.clone(), second.clone()]).unwrap();

        let sheets = read_workbook(&path).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0], first);
        assert_eq!(sheets[1], second);
    }

    #[test]
    fn formulas_are_written_with_cached_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut sheet = build_sheet(
            "Calculations",
            &[],
            &[row(&[("Sales", json!(100)), ("Cost", json!(60)), ("GM", json!(40))])],
        );
        sheet.formulas.push((1, 2, "A2-B2".to_string()));
        write_workbook(&path, &[sheet.clone()]).unwrap();

        let read = read_workbook(&path).unwrap();
        assert_eq!(read[0].formulas, vec![(1, 2, "A2-B2".to_string())]);
        assert_eq!(read[0].value_at(1, 2), Some(&json!(40)));
        assert_eq!(read[0], sheet);
    }
}
