//! Data layer: core types, loading, cleaning and statistics.
//!
//! Architecture:
//! ```text
//!   .csv upload
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse bytes → Dataset, Dataset → CSV
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  store    │  owns the active Dataset
//!   └──────────┘
//!      │     │
//!  &mut│     │&
//!      ▼     ▼
//!   ┌───────┐ ┌──────────┐ ┌─────────┐
//!   │ clean │ │ analysis │ │ summary │
//!   └───────┘ └──────────┘ └─────────┘
//! ```

pub mod analysis;
pub mod clean;
pub mod loader;
pub mod model;
pub mod store;
pub mod summary;
