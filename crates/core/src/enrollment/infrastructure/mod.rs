pub mod file_identity_store;
pub mod memory_identity_store;
