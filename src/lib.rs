/*!
# Store Planning Service

A small business-intelligence backend: authenticated users browse and edit
store and SKU reference data, view a planning grid of weekly sales and margin
rows, and chart gross margin per store and week.

## Data

All persistent data lives in one workbook file with three sheets:

- **Stores** - `Seq No.`, `ID`, `Label`, `City`, `State`
- **SKUs** - `ID`, `Label`, `Class`, `Department`, `Price`, `Cost`
- **Calculations** - `Store`, `SKU`, `Week`, `Sales Units`, `Sales Dollars`, `GM Dollars`, `GM %`

Column headers are the field names. Every request reads the workbook from disk;
every mutation rewrites the whole file. There is no locking, so overlapping
writers can lose an update.

## Modules

- **cell**: cell values and lenient field decoding
- **loader**: reading sheets with calamine
- **saving**: writing the workbook with rust_xlsxwriter
- **records**: typed load/save of entity sheets
- **models**: Store, SKU and calculation records, report shapes
- **stores**, **skus**: entity operations
- **reporting**: GM % annotation and store/week aggregation
- **graph**: PNG bar chart of a store's weekly margin
- **login**: single-account login and token checks
- **config**: command-line and environment configuration
- **app**: routing

## REST API Endpoints

- `GET|POST|DELETE /api/stores`
- `GET|POST|PUT|DELETE /api/skus` (`GET ?skuId=` for a single SKU)
- `GET /api/getPlanningData` - calculation rows with GM %
- `GET /api/chart` - GM dollars and GM % per store and week
- `GET /api/chart.png?store=` - the same as a bar chart
- `POST /api/login`, `POST /api/logout`, `GET /api/protected`
*/

pub mod cell;
pub mod error;
pub mod loader;
pub mod models;
pub mod records;
pub mod reporting;
pub mod saving;
pub mod skus;
pub mod stores;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod login;

pub use error::{ApiError, AuthError, WorkbookError};
pub use models::*;
pub use records::{Keyed, SheetRecord, ensure_workbook, find_by_id, load_all, save_all};
