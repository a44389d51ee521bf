//! Integration tests for the graph session facade

mod graph_reads;
mod realtime_callbacks;
pub mod test_utils;
