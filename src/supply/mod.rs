// src/supply/mod.rs
use std::collections::HashMap;

use tracing::debug;

/// One supply line: an item and how much of it is still deliverable.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyRecord {
    pub material: String,
    pub remaining_qty: f64,
}

/// Canonical string form of an item identifier, so ids that came out of the
/// workbook as numbers collide with the same ids written as text:
/// `"12345.0"`, `"12345"`, and a numeric cell holding 12345 all map to
/// `"12345"`. Anything that doesn't read as an integral number is just
/// trimmed.
pub fn canonical_item_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        _ => trimmed.to_string(),
    }
}

/// Total remaining deliverable quantity per item, grouped from supply lines.
/// Built once, read-only afterwards. An item absent here has no known
/// constraint and is always eligible for normalization.
#[derive(Debug, Clone, Default)]
pub struct SupplyIndex {
    totals: HashMap<String, f64>,
}

impl SupplyIndex {
    /// Group `records` by canonical item id and sum their quantities. An
    /// empty record list yields an empty index, which callers must treat as
    /// "no constraint data", not as an error.
    pub fn build(records: &[SupplyRecord]) -> Self {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for rec in records {
            let key = canonical_item_id(&rec.material);
            if key.is_empty() {
                continue;
            }
            *totals.entry(key).or_insert(0.0) += rec.remaining_qty;
        }
        for (material, qty) in &totals {
            debug!(%material, qty, "available quantity");
        }
        SupplyIndex { totals }
    }

    /// Remaining deliverable quantity for `item_id`, or `None` when the item
    /// has no supply data. The id is canonicalized before lookup.
    pub fn available(&self, item_id: &str) -> Option<f64> {
        self.totals.get(canonical_item_id(item_id).as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
