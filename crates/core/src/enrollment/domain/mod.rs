pub mod enrollment_aggregator;
pub mod identity_store;
