//! Reporting and plotting helpers.
//!
//! `report` assembles a standalone HTML page from maud markup and Plotly
//! figures; `plots` turns evaluation results into `plotly::Plot`s.
pub mod plots;
pub mod report;

pub use report::{Report, ReportSection};
