//! Writes flattened messages as CSV: node names form the header row, node values the records.

pub mod write;
