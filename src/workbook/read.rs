use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{info, instrument, warn};

use crate::normalize::{DemandRow, DemandTable};
use crate::supply::{canonical_item_id, SupplyRecord};

use super::{
    cell_number, cell_text, dates, SheetGrid, WorkbookError, WorkbookInput, DATA_SHEET,
    DEMAND_SHEET, MATERIAL_COLUMN, REMAINING_QTY_COLUMN,
};

/// Open the workbook at `path`, buffer every sheet in workbook order, and
/// decode the demand table plus any supply lines.
///
/// The demand sheet is required (case-insensitive name match); a missing data
/// sheet only costs the supply constraint check.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<WorkbookInput, WorkbookError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let mut book = open_workbook_auto(&path).map_err(|source| WorkbookError::Open {
        path: path.clone(),
        source,
    })?;

    let names = book.sheet_names().to_owned();
    info!(sheets = ?names, "workbook opened");

    let demand_sheet = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(DEMAND_SHEET))
        .cloned()
        .ok_or_else(|| WorkbookError::MissingDemandSheet { path: path.clone() })?;
    let data_sheet = names.iter().find(|n| n.eq_ignore_ascii_case(DATA_SHEET)).cloned();
    if data_sheet.is_none() {
        warn!("no 'DATA' sheet in workbook, supply constraint check will be skipped");
    }

    // Buffer every sheet up front so the writer can reproduce the untouched
    // ones without going back to the file.
    let mut sheets = Vec::with_capacity(names.len());
    for name in &names {
        let range = book
            .worksheet_range(name)
            .map_err(|source| WorkbookError::Sheet {
                sheet: name.clone(),
                source,
            })?;
        let cells: Vec<Vec<Data>> = range.rows().map(<[Data]>::to_vec).collect();
        sheets.push(SheetGrid {
            name: name.clone(),
            cells,
        });
    }

    let demand_grid = sheets
        .iter()
        .find(|s| s.name == demand_sheet)
        .expect("demand sheet buffered above");
    let demand = decode_demand(&demand_grid.cells);
    info!(
        rows = demand.rows.len(),
        periods = demand.period_count(),
        "demand table decoded"
    );

    let supply_records = match &data_sheet {
        Some(name) => {
            let grid = sheets
                .iter()
                .find(|s| s.name == *name)
                .expect("data sheet buffered above");
            decode_supply(&grid.cells)
        }
        None => Vec::new(),
    };

    Ok(WorkbookInput {
        path,
        sheets,
        demand_sheet,
        demand,
        supply_records,
    })
}

/// First row is headers; period headers (column 2 onward) may be serial
/// dates. Data rows: column 0 is the item id, column 1 a pass-through label,
/// the rest numeric periods. Rows are padded or truncated to the header
/// width so the table stays rectangular.
fn decode_demand(cells: &[Vec<Data>]) -> DemandTable {
    let Some(header_row) = cells.first() else {
        return DemandTable::default();
    };
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if i >= 2 {
                dates::header_text(cell)
            } else {
                cell_text(cell)
            }
        })
        .collect();
    let width = headers.len().saturating_sub(2);

    let rows = cells[1..]
        .iter()
        .map(|row| {
            let item_id = canonical_item_id(&cell_text(row.first().unwrap_or(&Data::Empty)));
            let label = cell_text(row.get(1).unwrap_or(&Data::Empty));
            let mut periods: Vec<f64> = row.iter().skip(2).map(cell_number).collect();
            periods.resize(width, 0.0);
            DemandRow {
                item_id,
                label,
                periods,
            }
        })
        .collect();

    DemandTable { headers, rows }
}

/// Pull supply lines out of the data sheet. Both required columns must be
/// present by exact header text; otherwise the sheet contributes nothing and
/// the caller proceeds without constraint data.
fn decode_supply(cells: &[Vec<Data>]) -> Vec<SupplyRecord> {
    let Some(headers) = cells.first() else {
        warn!("data sheet is empty, supply constraint check will be skipped");
        return Vec::new();
    };
    let position = |wanted: &str| headers.iter().position(|c| cell_text(c) == wanted);
    let (Some(material_col), Some(qty_col)) =
        (position(MATERIAL_COLUMN), position(REMAINING_QTY_COLUMN))
    else {
        warn!(
            "columns {MATERIAL_COLUMN:?} / {REMAINING_QTY_COLUMN:?} not found in data sheet, \
             supply constraint check will be skipped"
        );
        return Vec::new();
    };

    let records: Vec<SupplyRecord> = cells[1..]
        .iter()
        .filter_map(|row| {
            let material = cell_text(row.get(material_col)?);
            if material.is_empty() {
                return None;
            }
            let remaining_qty = cell_number(row.get(qty_col).unwrap_or(&Data::Empty));
            Some(SupplyRecord {
                material,
                remaining_qty,
            })
        })
        .collect();
    info!(records = records.len(), "supply records decoded");
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn decode_demand_pads_short_rows() {
        let cells = vec![
            vec![s("Item"), s("Description"), s("W1"), s("W2"), s("W3")],
            vec![s("A"), s("thing"), Data::Float(5.0)],
        ];
        let table = decode_demand(&cells);
        assert_eq!(table.rows[0].periods, vec![5.0, 0.0, 0.0]);
    }

    #[test]
    fn decode_demand_canonicalizes_numeric_ids() {
        let cells = vec![
            vec![s("Item"), s("Description"), s("W1")],
            vec![Data::Float(1001.0), s("thing"), Data::Float(1.0)],
        ];
        let table = decode_demand(&cells);
        assert_eq!(table.rows[0].item_id, "1001");
    }

    #[test]
    fn nan_text_cell_does_not_defeat_preservation() {
        use crate::normalize::normalize_table;
        use crate::supply::{SupplyIndex, SupplyRecord};

        let cells = vec![
            vec![s("Item"), s("Description"), s("W1"), s("W2")],
            vec![s("A"), s("thing"), s("NaN"), Data::Float(201.0)],
        ];
        let table = decode_demand(&cells);
        // the bad cell coerces to zero, so the row total stays finite
        assert_eq!(table.rows[0].periods, vec![0.0, 201.0]);

        let index = SupplyIndex::build(&[SupplyRecord {
            material: "A".to_string(),
            remaining_qty: 50.0,
        }]);
        let out = normalize_table(&table, &index);
        // raw total 201 > available 50: preserved verbatim, 201 stays unrounded
        assert_eq!(out.rows[0].periods, vec![0.0, 201.0]);
    }

    #[test]
    fn decode_demand_of_empty_grid_is_empty() {
        let table = decode_demand(&[]);
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn decode_supply_reads_both_columns() {
        let cells = vec![
            vec![s("Material"), s("Still to be delivered (qty)")],
            vec![Data::Float(42.0), Data::Float(10.0)],
            vec![s("B-7"), s("2.5")],
            vec![Data::Empty, Data::Float(99.0)],
        ];
        let records = decode_supply(&cells);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].material, "42");
        assert_eq!(records[0].remaining_qty, 10.0);
        assert_eq!(records[1].material, "B-7");
        assert_eq!(records[1].remaining_qty, 2.5);
    }

    #[test]
    fn decode_supply_needs_both_headers() {
        let cells = vec![
            vec![s("Material"), s("Qty")],
            vec![s("A"), Data::Float(1.0)],
        ];
        assert!(decode_supply(&cells).is_empty());
    }
}
