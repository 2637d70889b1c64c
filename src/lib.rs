//! Extraction of clinical gait parameters from fixed-template gait-analysis
//! PDF reports.
//!
//! ```text
//! PDF bytes ──▶ pdf::reader (text) ──▶ extract (fields, age)
//!           └─▶ render (300 DPI) ──▶ chart (crop, segment, ROM/peak)
//!                                        │
//!                 record::assembler ◀────┘ ──▶ store (SQLite)
//! ```

pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod extract;
pub mod pdf;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod store;
