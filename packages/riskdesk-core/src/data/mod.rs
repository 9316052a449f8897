//! Price sources and CSV persistence.
//!
//! Nothing here computes metrics. This module feeds raw prices into the pipeline and
//! writes result tables back out.

mod export;
mod source;

pub use export::{
    export_report, save_raw_prices, save_summary, save_table, write_raw_prices, write_summary,
    write_table,
};
pub use source::{read_prices, CsvPriceSource, PriceRequest, PriceSource};
