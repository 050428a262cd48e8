//! Domain logic
//!
//! - `metrics` - OTLP metric grouping and EMF rendering

pub mod metrics;
