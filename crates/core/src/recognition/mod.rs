pub mod display_name;
pub mod session_aggregator;
