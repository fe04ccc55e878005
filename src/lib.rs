//! Demand-forecast workbook normalizer.
//!
//! Reads a workbook containing a DEMAND sheet (rows = items, columns = time
//! periods) and an optional DATA sheet of supply lines, consolidates small
//! per-period demand values into the next period, rounds the rest up to
//! multiples of ten, and keeps any row untouched whose total raw demand
//! already exceeds the item's remaining deliverable quantity.

pub mod normalize;
pub mod supply;
pub mod workbook;
