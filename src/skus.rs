use serde::Deserialize;
use std::path::Path;

use crate::cell::CellValue;
use crate::error::ApiError;
use crate::models::Sku;
use crate::records;

/// Body of SKU create and update requests.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SkuPayload {
    #[serde(rename = "ID", default)]
    pub id: Option<CellValue>,

    #[serde(rename = "Label", default)]
    pub label: Option<CellValue>,

    #[serde(rename = "Class", default)]
    pub class: Option<CellValue>,

    #[serde(rename = "Department", default)]
    pub department: Option<CellValue>,

    #[serde(rename = "Price", default)]
    pub price: Option<CellValue>,

    #[serde(rename = "Cost", default)]
    pub cost: Option<CellValue>,
}

impl SkuPayload {
    fn id(&self) -> Option<String> {
        self.id.as_ref().filter(|v| v.is_truthy()).map(CellValue::label)
    }

    fn is_complete(&self) -> bool {
        [
            &self.id,
            &self.label,
            &self.class,
            &self.department,
            &self.price,
            &self.cost,
        ]
        .iter()
        .all(|field| matches!(field, Some(v) if v.is_truthy()))
    }

    /// Build the full record. Absent text fields become empty; price and cost
    /// are kept exactly as supplied.
    fn into_sku(self) -> Sku {
        let text = |v: Option<CellValue>| v.map(|v| v.label()).unwrap_or_default();
        Sku {
            id: text(self.id),
            label: text(self.label),
            class: text(self.class),
            department: text(self.department),
            price: self.price,
            cost: self.cost,
            ..Sku::default()
        }
    }
}

/// Body of a SKU delete request.
#[derive(Debug, Default, Deserialize)]
pub struct SkuId {
    #[serde(rename = "ID", default)]
    pub id: Option<CellValue>,
}

pub fn list_skus(path: &Path) -> Result<Vec<Sku>, ApiError> {
    let skus: Vec<Sku> = records::load_all(path)?;
    log::info!("loaded {} skus", skus.len());
    Ok(skus)
}

/// Look up one SKU by identifier.
pub fn find_sku(path: &Path, id: &str) -> Result<Sku, ApiError> {
    let skus = list_skus(path)?;
    records::find_by_id(&skus, id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound("SKU not found".to_string()))
}

/// Append a SKU and return the full list. Identifiers are not checked for uniqueness.
pub fn create_sku(path: &Path, payload: SkuPayload) -> Result<Vec<Sku>, ApiError> {
    if !payload.is_complete() {
        return Err(ApiError::Validation("Missing SKU fields".to_string()));
    }

    let mut skus: Vec<Sku> = records::load_all(path)?;
    let sku = payload.into_sku();
    log::info!("adding sku {}", sku.id);
    skus.push(sku);
    records::save_all(path, &skus)?;
    Ok(skus)
}

/// Replace the first SKU with the payload's identifier and return the full list.
pub fn update_sku(path: &Path, payload: SkuPayload) -> Result<Vec<Sku>, ApiError> {
    let id = payload
        .id()
        .ok_or_else(|| ApiError::Validation("SKU ID is required for updating".to_string()))?;

    let mut skus: Vec<Sku> = records::load_all(path)?;
    let index = skus
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| ApiError::NotFound("SKU not found".to_string()))?;

    skus[index] = payload.into_sku();
    records::save_all(path, &skus)?;

    log::info!("updated sku {}", id);
    Ok(skus)
}

/// Remove every SKU with the given identifier and return what remains.
pub fn delete_sku(path: &Path, body: SkuId) -> Result<Vec<Sku>, ApiError> {
    let id = body
        .id
        .filter(CellValue::is_truthy)
        .map(|v| v.label())
        .ok_or_else(|| ApiError::Validation("SKU ID is required for deletion".to_string()))?;

    let skus: Vec<Sku> = records::load_all(path)?;
    let before = skus.len();
    let remaining: Vec<Sku> = skus.into_iter().filter(|s| s.id != id).collect();
    if remaining.len() == before {
        return Err(ApiError::NotFound("SKU not found".to_string()));
    }
    records::save_all(path, &remaining)?;

    log::info!("deleted sku {}", id);
    Ok(remaining)
}
