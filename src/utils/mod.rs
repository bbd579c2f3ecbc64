//! Utility modules: in-memory collaborators and validation helpers

pub mod memory_storage;
pub mod validation;

pub use memory_storage::{MemoryInvoices, MemoryStore, PaymentRecord, RecordingGateway};
