//! Price table preparation.
//!
//! Turns raw, possibly unsorted and gappy observations into a densely indexed
//! [`PriceTable`](crate::PriceTable) ready for differencing.

mod cleaner;

pub use cleaner::{clean, drop_empty_rows, forward_fill, MIN_PRESENT_FRACTION};
