//! Display module for colour management and table output

pub mod colours;
pub mod table;

pub use colours::ColourManager;
pub use table::{format_compact_table, functions_table, stats_table, usage_table, visualizations_table};
