//! Data layer: catalog, selection, raw observations and their sources.
//!
//! Architecture:
//! ```text
//!  catalog .json            .parquet / .json / .csv
//!        │                          │
//!        ▼                          ▼
//!   ┌──────────┐              ┌──────────┐
//!   │  loader   │             │  loader   │  parse file → ObservationTable
//!   └──────────┘              └──────────┘
//!        │                          │
//!        ▼                          ▼
//!   ┌──────────┐  criterion   ┌──────────────────┐
//!   │ Catalog   │ ──────────▶ │ selection::resolve │ → ResolvedCountrySet
//!   └──────────┘              └──────────────────┘
//!                                   │
//!                                   ▼
//!                          ┌──────────────────┐
//!                          │ ObservationSource │  fetch(indicators, countries)
//!                          └──────────────────┘
//! ```

pub mod export;
pub mod loader;
pub mod model;
pub mod observation;
pub mod selection;
pub mod source;
