// src/normalize/mod.rs
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::supply::SupplyIndex;

pub mod row;

/// One demand line. The first two workbook columns are identifiers and pass
/// through untouched; everything after them is a numeric period value
/// (missing / non-numeric cells were coerced to `0.0` when the sheet was
/// decoded).
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRow {
    pub item_id: String,
    pub label: String,
    pub periods: Vec<f64>,
}

/// The demand sheet as a rectangular table, rows in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandTable {
    /// Column headers, including the two identifier columns. Serial-date
    /// headers have already been rendered as date strings.
    pub headers: Vec<String>,
    pub rows: Vec<DemandRow>,
}

impl DemandTable {
    pub fn period_count(&self) -> usize {
        self.headers.len().saturating_sub(2)
    }
}

/// True when the row must keep its raw values: the supply index knows the
/// item and the row's total raw demand exceeds what is still deliverable.
/// Decided from the original values, before any mutation.
fn exceeds_supply(r: &DemandRow, supply: &SupplyIndex) -> bool {
    let Some(available) = supply.available(&r.item_id) else {
        return false;
    };
    let demand = row::raw_total(&r.periods);
    debug!(item = %r.item_id, available, demand, "supply check");
    demand > available
}

/// Normalize every row of `table` against `supply`.
///
/// Rows are independent, so the transform maps over them in parallel; the
/// positional map keeps the output in sheet order. Rows whose raw demand
/// exceeds the available supply are returned verbatim, the rest get the
/// consolidate-then-round treatment from [`row`].
#[instrument(level = "info", skip(table, supply), fields(rows = table.rows.len()))]
pub fn normalize_table(table: &DemandTable, supply: &SupplyIndex) -> DemandTable {
    let preserve: Vec<bool> = table
        .rows
        .iter()
        .map(|r| exceeds_supply(r, supply))
        .collect();

    let kept = preserve.iter().filter(|p| **p).count();
    if kept > 0 {
        let items: Vec<&str> = table
            .rows
            .iter()
            .zip(&preserve)
            .filter(|(_, p)| **p)
            .map(|(r, _)| r.item_id.as_str())
            .collect();
        info!(kept, items = ?items, "raw demand exceeds supply, keeping original values");
    }

    let rows: Vec<DemandRow> = table
        .rows
        .par_iter()
        .zip(preserve.par_iter())
        .map(|(r, keep)| {
            if *keep {
                r.clone()
            } else {
                DemandRow {
                    item_id: r.item_id.clone(),
                    label: r.label.clone(),
                    periods: row::normalize_periods(&r.periods),
                }
            }
        })
        .collect();

    DemandTable {
        headers: table.headers.clone(),
        rows,
    }
}
