/// Data layer: table model, CSV loading, and smoothing.
///
/// Architecture:
/// ```text
///   .csv  (WL, "Signal, 1ps", WL, "Signal, 5ps", ...)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Column>, paired into labelled Traces
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  optional Savitzky-Golay smoothing per trace
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
