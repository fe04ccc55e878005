// src/workbook/mod.rs
//
// Container adapters around the core transform: locate the demand and data
// sheets in a workbook, decode them into typed tables, and write the
// normalized result to a new file with every other sheet reproduced.

use std::path::PathBuf;

use calamine::Data;
use thiserror::Error;

use crate::normalize::DemandTable;
use crate::supply::SupplyRecord;

pub mod dates;
pub mod read;
pub mod write;

/// Logical sheet names, matched case-insensitively against the workbook.
pub const DEMAND_SHEET: &str = "demand";
pub const DATA_SHEET: &str = "data";

/// Required supply-table columns, matched by exact header text.
pub const MATERIAL_COLUMN: &str = "Material";
pub const REMAINING_QTY_COLUMN: &str = "Still to be delivered (qty)";

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    /// Fatal: without a demand sheet there is nothing to normalize and
    /// nothing is written.
    #[error("no sheet named 'DEMAND' (case-insensitive) in {path}")]
    MissingDemandSheet { path: PathBuf },
    #[error("failed to read sheet {sheet}: {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
}

/// One sheet's raw cell grid, in workbook order.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub name: String,
    pub cells: Vec<Vec<Data>>,
}

/// Everything read from the input workbook in one pass: the raw grids (so the
/// writer can reproduce the untouched sheets), the decoded demand table, and
/// the supply lines for the index.
#[derive(Debug)]
pub struct WorkbookInput {
    pub path: PathBuf,
    pub sheets: Vec<SheetGrid>,
    /// Actual name of the demand sheet as it appears in the workbook.
    pub demand_sheet: String,
    pub demand: DemandTable,
    pub supply_records: Vec<SupplyRecord>,
}

/// Display text of a cell. Strings are trimmed; everything else renders the
/// way it reads.
pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

/// Numeric value of a cell, coercing missing / non-numeric content to `0.0`.
/// Bad cells are a local recovery, never an error. Text that parses to a
/// non-finite float ("NaN", "inf") counts as non-numeric: a NaN here would
/// poison the row total and with it the over-supply check. Date cells in a
/// period column are also treated as non-numeric; their day serial is not a
/// demand quantity.
pub(crate) fn cell_number(cell: &Data) -> f64 {
    match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        Data::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Data::Empty
        | Data::DateTime(_)
        | Data::DateTimeIso(_)
        | Data::DurationIso(_)
        | Data::Error(_) => 0.0,
    }
}
