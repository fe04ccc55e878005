use calamine::Data;
use chrono::{Duration, NaiveDate};
use tracing::warn;

use super::cell_text;

/// Day-serial origin of the workbooks we read: serial 1 is 1899-12-31.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Render an Excel day serial as `MM/DD/YYYY`. Fractional time-of-day is
/// dropped. Returns `None` for serials far enough out to overflow a date.
pub fn serial_to_date(serial: f64) -> Option<String> {
    let origin = NaiveDate::from_ymd_opt(EXCEL_EPOCH.0, EXCEL_EPOCH.1, EXCEL_EPOCH.2)?;
    let date = origin.checked_add_signed(Duration::try_days(serial as i64)?)?;
    Some(date.format("%m/%d/%Y").to_string())
}

/// Display text of a period header cell. Numeric headers are Excel serial
/// dates and render as date strings; anything else passes through as text.
pub fn header_text(cell: &Data) -> String {
    let serial = match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::DateTime(dt) => Some(dt.as_f64()),
        _ => None,
    };
    match serial {
        Some(s) => serial_to_date(s).unwrap_or_else(|| {
            warn!(serial = s, "header serial did not decode as a date");
            cell_text(cell)
        }),
        None => cell_text(cell),
    }
}
