//! Support code for the command-line tools and the fixture tests.
//!
//! - **`data_loader`**: Parses the plain-text symmetric matrix format used by the
//!   `data/` fixtures and the `eigs` binary.
//!
//! - **`perf`**: Wall-time and peak-memory measurement for the strategy trade-off
//!   benchmark.

pub mod data_loader;
pub mod perf;
