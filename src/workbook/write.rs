use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::Data;
use rand::Rng;
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::{debug, info, instrument, warn};

use crate::normalize::DemandTable;

use super::WorkbookInput;

/// `<stem>_output_<NNNN>.xlsx` beside the input; the random suffix keeps
/// reruns from colliding with an earlier result.
pub fn default_output_path(input: &Path) -> PathBuf {
    let n: u32 = rand::rng().random_range(1000..=9999);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    input.with_file_name(format!("{stem}_output_{n}.xlsx"))
}

/// Resolve a path for the overwrite guard. Existing paths (the input, or an
/// output symlink) canonicalize fully; a not-yet-written output resolves its
/// parent and keeps the file name, so `./out.xlsx` and its absolute form
/// compare equal.
fn resolved(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Write every sheet of `input` to `out_path` in workbook order, with the
/// demand sheet replaced by `normalized`. Never writes over the input, even
/// through a relative alias or symlink. If the first save fails, one retry
/// happens at a freshly named fallback path; the path actually written is
/// returned.
#[instrument(level = "info", skip(input, normalized, out_path), fields(out = %out_path.display()))]
pub fn write_workbook(
    input: &WorkbookInput,
    normalized: &DemandTable,
    out_path: &Path,
) -> Result<PathBuf> {
    anyhow::ensure!(
        resolved(out_path) != resolved(&input.path),
        "output path {} would overwrite the input workbook",
        input.path.display()
    );

    match save_workbook(input, normalized, out_path) {
        Ok(()) => {
            info!(path = %out_path.display(), "output written");
            Ok(out_path.to_path_buf())
        }
        Err(err) => {
            warn!(error = %err, "write failed, retrying at a fallback path");
            let fallback = default_output_path(&input.path);
            save_workbook(input, normalized, &fallback)
                .with_context(|| format!("fallback write to {} also failed", fallback.display()))?;
            info!(path = %fallback.display(), "output written at fallback path");
            Ok(fallback)
        }
    }
}

fn save_workbook(input: &WorkbookInput, normalized: &DemandTable, out_path: &Path) -> Result<()> {
    let mut book = Workbook::new();
    for sheet in &input.sheets {
        let ws = book.add_worksheet();
        ws.set_name(&sheet.name)?;
        if sheet.name == input.demand_sheet {
            write_demand(ws, &sheet.cells, normalized)?;
            debug!(sheet = %sheet.name, "replaced with normalized table");
        } else {
            for (r, row) in sheet.cells.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    write_cell(ws, r as u32, c as u16, cell)?;
                }
            }
            debug!(sheet = %sheet.name, "copied unchanged");
        }
    }
    book.save(out_path)
        .with_context(|| format!("failed to save workbook to {}", out_path.display()))?;
    Ok(())
}

/// Headers come from the decoded table (serial dates already rendered); the
/// two identifier columns pass through with their original cell values; the
/// period columns carry the normalized numbers.
fn write_demand(ws: &mut Worksheet, original: &[Vec<Data>], table: &DemandTable) -> Result<()> {
    for (c, header) in table.headers.iter().enumerate() {
        ws.write_string(0, c as u16, header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let excel_row = r as u32 + 1;
        let original_row = original.get(r + 1);
        for c in 0..table.headers.len().min(2) {
            let cell = original_row
                .and_then(|cells| cells.get(c))
                .unwrap_or(&Data::Empty);
            write_cell(ws, excel_row, c as u16, cell)?;
        }
        for (c, v) in row.periods.iter().enumerate() {
            ws.write_number(excel_row, c as u16 + 2, *v)?;
        }
    }
    Ok(())
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Data) -> Result<()> {
    match cell {
        Data::Empty => {}
        Data::String(s) => {
            ws.write_string(row, col, s)?;
        }
        Data::Float(f) => {
            ws.write_number(row, col, *f)?;
        }
        Data::Int(i) => {
            ws.write_number(row, col, *i as f64)?;
        }
        Data::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        Data::DateTime(dt) => {
            ws.write_number(row, col, dt.as_f64())?;
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => {
            ws.write_string(row, col, s)?;
        }
        Data::Error(e) => {
            ws.write_string(row, col, e.to_string())?;
        }
    }
    Ok(())
}
