//! Raw-record sources (network fetch and cached snapshots).

pub mod arcgis;

pub use arcgis::*;
