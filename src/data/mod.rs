//! Data layer: core types, loading, and row filtering.
//!
//! Architecture:
//! ```text
//!      .csv (ISO-8859-1)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader  │  parse file → Dataset, infer column kinds
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ Dataset  │  ordered typed columns, nullable cells
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter  │  combine per-column row masks → surviving rows
//!   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
