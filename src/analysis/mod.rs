//! Analysis layer: panel alignment and extremum extraction.
//!
//! ```text
//!   ObservationTable + indicator + ResolvedCountrySet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  panel    │  periods × countries, newest first
//!   └──────────┘
//!        │                 └──────▶ full-series display
//!        ▼
//!   ┌──────────┐
//!   │ extremes  │  first / last CrossSection, fallback policy
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ proportion │  positive shares for pie comparison
//!   └────────────┘
//! ```

pub mod extremes;
pub mod panel;
pub mod proportion;

pub use extremes::{extremes, CrossSection, Entry, Extremes, Strategy};
pub use panel::{build_panel, Panel};
pub use proportion::{PieComparison, Proportions, Slice};
