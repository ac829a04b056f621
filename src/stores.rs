use serde::Deserialize;
use std::path::Path;

use crate::cell::CellValue;
use crate::error::ApiError;
use crate::models::Store;
use crate::records;

/// Body of a store creation request. Lower-case field names are accepted too.
#[derive(Debug, Default, Deserialize)]
pub struct NewStore {
    #[serde(rename = "ID", alias = "id", default)]
    pub id: Option<CellValue>,

    #[serde(rename = "Label", alias = "label", default)]
    pub label: Option<CellValue>,

    #[serde(rename = "City", alias = "city", default)]
    pub city: Option<CellValue>,

    #[serde(rename = "State", alias = "state", default)]
    pub state: Option<CellValue>,
}

impl NewStore {
    /// Check that every field is present and non-empty, returning the values
    /// as (id, label, city, state).
    fn validate(self) -> Result<(String, String, String, String), ApiError> {
        let required = |v: Option<CellValue>| v.filter(CellValue::is_truthy).map(|v| v.label());

        match (
            required(self.id),
            required(self.label),
            required(self.city),
            required(self.state),
        ) {
            (Some(id), Some(label), Some(city), Some(state)) => Ok((id, label, city, state)),
            _ => Err(ApiError::Validation(
                "All fields (ID, Label, City, State) are required".to_string(),
            )),
        }
    }
}

/// Next sequence number: one past the highest in use, or 1 for an empty list.
pub fn next_seq_no(stores: &[Store]) -> u64 {
    stores.iter().map(|s| s.seq_no).max().unwrap_or(0) + 1
}

/// Remove the first store with the given identifier.
pub fn remove_first(stores: &mut Vec<Store>, id: &str) -> Option<Store> {
    let index = stores.iter().position(|s| s.id == id)?;
    Some(stores.remove(index))
}

pub fn list_stores(path: &Path) -> Result<Vec<Store>, ApiError> {
    let stores: Vec<Store> = records::load_all(path)?;
    log::info!("loaded {} stores", stores.len());
    Ok(stores)
}

/// Append a new store and return it with its assigned sequence number.
///
/// Identifiers are not checked for uniqueness.
pub fn create_store(path: &Path, new_store: NewStore) -> Result<Store, ApiError> {
    let (id, label, city, state) = new_store.validate()?;

    let mut stores: Vec<Store> = records::load_all(path)?;
    let store = Store {
        seq_no: next_seq_no(&stores),
        id,
        label,
        city,
        state,
        ..Store::default()
    };
    stores.push(store.clone());
    records::save_all(path, &stores)?;

    log::info!("added store {} (seq {})", store.id, store.seq_no);
    Ok(store)
}

/// Delete the first store matching `id`. The workbook is only rewritten when a
/// store was removed.
pub fn delete_store(path: &Path, id: &str) -> Result<Store, ApiError> {
    if id.is_empty() {
        return Err(ApiError::Validation("ID is required for deletion".to_string()));
    }

    let mut stores: Vec<Store> = records::load_all(path)?;
    let removed = remove_first(&mut stores, id)
        .ok_or_else(|| ApiError::NotFound(format!("Store with ID {} not found", id)))?;
    records::save_all(path, &stores)?;

    log::info!("deleted store {}", id);
    Ok(removed)
}
