use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cell::{self, CellValue};
use crate::records::{Keyed, SheetRecord};

/// One row of the "Stores" sheet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Insertion sequence number, assigned at creation.
    #[serde(rename = "Seq No.", default, deserialize_with = "cell::count_or_zero")]
    pub seq_no: u64,

    #[serde(rename = "ID", default, deserialize_with = "cell::text")]
    pub id: String,

    #[serde(rename = "Label", default, deserialize_with = "cell::text")]
    pub label: String,

    #[serde(rename = "City", default, deserialize_with = "cell::text")]
    pub city: String,

    #[serde(rename = "State", default, deserialize_with = "cell::text")]
    pub state: String,

    /// Any further columns of the row, written back as they were read.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SheetRecord for Store {
    const SHEET: &'static str = "Stores";
    const HEADERS: &'static [&'static str] = &["Seq No.", "ID", "Label", "City", "State"];
}

impl Keyed for Store {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One row of the "SKUs" sheet.
///
/// Price and cost keep whatever type the client supplied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    #[serde(rename = "ID", default, deserialize_with = "cell::text")]
    pub id: String,

    #[serde(rename = "Label", default, deserialize_with = "cell::text")]
    pub label: String,

    #[serde(rename = "Class", default, deserialize_with = "cell::text")]
    pub class: String,

    #[serde(rename = "Department", default, deserialize_with = "cell::text")]
    pub department: String,

    #[serde(rename = "Price", default)]
    pub price: Option<CellValue>,

    #[serde(rename = "Cost", default)]
    pub cost: Option<CellValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SheetRecord for Sku {
    const SHEET: &'static str = "SKUs";
    const HEADERS: &'static [&'static str] = &["ID", "Label", "Class", "Department", "Price", "Cost"];
}

impl Keyed for Sku {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One row of the "Calculations" sheet, kept as read.
///
/// A stored "GM %" column is ignored; the percentage is always recomputed from
/// the dollar columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationRow {
    #[serde(rename = "Store", default, skip_serializing_if = "Option::is_none")]
    pub store: Option<CellValue>,

    #[serde(rename = "SKU", default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<CellValue>,

    #[serde(rename = "Week", default, skip_serializing_if = "Option::is_none")]
    pub week: Option<CellValue>,

    #[serde(rename = "Sales Units", default, skip_serializing_if = "Option::is_none")]
    pub sales_units: Option<CellValue>,

    #[serde(rename = "Sales Dollars", default, skip_serializing_if = "Option::is_none")]
    pub sales_dollars: Option<CellValue>,

    #[serde(rename = "GM Dollars", default, skip_serializing_if = "Option::is_none")]
    pub gm_dollars: Option<CellValue>,

    #[serde(rename = "GM %", default, skip_serializing)]
    pub recorded_gm_percent: Option<CellValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CalculationRow {
    /// Sales dollars as a number; blank or non-numeric cells count as 0.
    pub fn sales_amount(&self) -> f64 {
        cell::number_or_zero(self.sales_dollars.as_ref())
    }

    /// Gross-margin dollars as a number; blank or non-numeric cells count as 0.
    pub fn gm_amount(&self) -> f64 {
        cell::number_or_zero(self.gm_dollars.as_ref())
    }
}

impl SheetRecord for CalculationRow {
    const SHEET: &'static str = "Calculations";
    const HEADERS: &'static [&'static str] = &[
        "Store",
        "SKU",
        "Week",
        "Sales Units",
        "Sales Dollars",
        "GM Dollars",
        "GM %",
    ];
}

/// A calculation row annotated with its gross-margin percentage, as served to
/// the planning grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanningRow {
    #[serde(flatten)]
    pub row: CalculationRow,

    #[serde(rename = "GM %")]
    pub gm_percent: f64,
}

/// Gross margin of one store for one week, summed over all SKUs.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekAggregate {
    pub week: String,
    pub gm_dollars: f64,
    pub gm_percent: f64,
}

/// Per-week gross margin of one store, as served to the chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreAggregate {
    pub store: String,
    pub weeks: Vec<WeekAggregate>,
}
