use calamine::{Data, Range, Reader, open_workbook_auto};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::WorkbookError;

/// Header-keyed view of one data row. Empty cells are absent.
pub type Row = Map<String, Value>;

/// A sheet's used range, with the cell values converted to JSON values.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSheet {
    pub name: String,
    /// Zero-based (row, col) of the first used cell.
    pub origin: (u32, u32),
    pub grid: Vec<Vec<Option<Value>>>,
    /// Formula cells as (row, col, formula) at absolute zero-based positions,
    /// without the leading `=`. The grid holds their cached values.
    pub formulas: Vec<(u32, u32, String)>,
}

impl RawSheet {
    /// Value of the cell at an absolute position, if inside the grid and non-empty.
    pub fn value_at(&self, row: u32, col: u32) -> Option<&Value> {
        let r = row.checked_sub(self.origin.0)? as usize;
        let c = col.checked_sub(self.origin.1)? as usize;
        self.grid.get(r)?.get(c)?.as_ref()
    }

    /// Convert the grid into header-keyed rows.
    ///
    /// The first row of the used range is the header row. Columns with a blank
    /// header are ignored, and rows with no values at all are skipped.
    pub fn rows(&self) -> Vec<Row> {
        let mut grid = self.grid.iter();
        let headers: Vec<Option<String>> = match grid.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.as_ref().map(header_label).filter(|h| !h.is_empty()))
                .collect(),
            None => return Vec::new(),
        };

        grid.filter_map(|cells| {
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(cells) {
                if let (Some(header), Some(value)) = (header, cell) {
                    row.insert(header.clone(), value.clone());
                }
            }
            (!row.is_empty()).then_some(row)
        })
        .collect()
    }
}

fn header_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Read a single named sheet's values. Formulas are not collected.
///
/// # Errors
/// * `WorkbookError::Unreadable` if the file is missing or cannot be parsed
/// * `WorkbookError::SheetNotFound` if the workbook has no sheet with that name
pub fn read_sheet(path: impl AsRef<Path>, name: &str) -> Result<RawSheet, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;

    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(WorkbookError::SheetNotFound(name.to_string()));
    }

    let range = workbook.worksheet_range(name)?;
    Ok(to_raw_sheet(name, &range, Vec::new()))
}

/// Read every sheet in the workbook, in workbook order, with its formulas.
pub fn read_workbook(path: impl AsRef<Path>) -> Result<Vec<RawSheet>, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in &names {
        let range = workbook.worksheet_range(name)?;
        let formulas = formula_cells(&workbook.worksheet_formula(name)?);
        sheets.push(to_raw_sheet(name, &range, formulas));
    }
    Ok(sheets)
}

fn formula_cells(range: &Range<String>) -> Vec<(u32, u32, String)> {
    let (row0, col0) = range.start().unwrap_or((0, 0));
    range
        .used_cells()
        .map(|(r, c, formula)| (row0 + r as u32, col0 + c as u32, formula.clone()))
        .collect()
}

fn to_raw_sheet(name: &str, range: &Range<Data>, formulas: Vec<(u32, u32, String)>) -> RawSheet {
    let origin = range.start().unwrap_or((0, 0));
    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    RawSheet {
        name: name.to_string(),
        origin,
        grid,
        formulas,
    }
}

/// Convert a calamine cell into a JSON value. Integral floats become integers,
/// since spreadsheets store every number as a float.
pub fn cell_to_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(float_to_value(*f)),
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => Some(float_to_value(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::Error(e) => Some(Value::String(e.to_string())),
    }
}

fn float_to_value(f: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if f.fract() == 0.0 && f.abs() < MAX_SAFE {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
