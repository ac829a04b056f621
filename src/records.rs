//! Typed access to the entity sheets of the workbook.
//!
//! Every call goes to disk: a load parses the workbook, a save re-reads it,
//! swaps in the target sheet and rewrites the whole file. Nothing is cached
//! and there is no locking, so two writers that overlap can lose one update.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

use crate::error::WorkbookError;
use crate::loader::{self, Row};
use crate::models::{CalculationRow, Sku, Store};
use crate::saving;

/// An entity stored one-per-row in a named sheet. Column headers are the serde
/// field names.
pub trait SheetRecord: Serialize + DeserializeOwned {
    const SHEET: &'static str;
    /// Header row written when the sheet holds no records.
    const HEADERS: &'static [&'static str];
}

/// Records addressed by a string identifier.
pub trait Keyed {
    fn id(&self) -> &str;
}

/// Load every record of `T`'s sheet, in sheet order.
pub fn load_all<T: SheetRecord>(path: impl AsRef<Path>) -> Result<Vec<T>, WorkbookError> {
    let sheet = loader::read_sheet(path, T::SHEET)?;

    sheet
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value(Value::Object(row)).map_err(|e| WorkbookError::MalformedRow {
                sheet: T::SHEET.to_string(),
                row: i + 1,
                detail: e.to_string(),
            })
        })
        .collect()
}

/// Replace `T`'s sheet with `records` and rewrite the workbook.
///
/// Other sheets are re-emitted by value at their original positions.
pub fn save_all<T: SheetRecord>(path: impl AsRef<Path>, records: &[T]) -> Result<(), WorkbookError> {
    let path = path.as_ref();
    let mut sheets = loader::read_workbook(path)?;

    let index = sheets
        .iter()
        .position(|s| s.name == T::SHEET)
        .ok_or_else(|| WorkbookError::SheetNotFound(T::SHEET.to_string()))?;

    let rows = records
        .iter()
        .map(to_row)
        .collect::<Result<Vec<Row>, WorkbookError>>()?;
    sheets[index] = saving::build_sheet(T::SHEET, T::HEADERS, &rows);

    saving::write_workbook(path, &sheets)
}

fn to_row<T: Serialize>(record: &T) -> Result<Row, WorkbookError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(WorkbookError::Write(format!(
            "record serialized to {} instead of an object",
            other
        ))),
        Err(e) => Err(WorkbookError::Write(e.to_string())),
    }
}

/// First record whose identifier equals `id` exactly.
pub fn find_by_id<'a, T: Keyed>(records: &'a [T], id: &str) -> Option<&'a T> {
    records.iter().find(|r| r.id() == id)
}

/// Create an empty workbook with the entity sheets if `path` does not exist.
///
/// Returns `true` when a new file was written. An existing file is never touched.
pub fn ensure_workbook(path: impl AsRef<Path>) -> Result<bool, WorkbookError> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let sheets = [
        saving::build_sheet(Store::SHEET, Store::HEADERS, &[]),
        saving::build_sheet(Sku::SHEET, Sku::HEADERS, &[]),
        saving::build_sheet(CalculationRow::SHEET, CalculationRow::HEADERS, &[]),
    ];
    saving::write_workbook(path, &sheets)?;
    Ok(true)
}
